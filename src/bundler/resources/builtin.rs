//! Resources shipped with the bundler.

const REDISTRIBUTABLE_LIST: &str = "\
; Runtime modules that may be redistributed with an application.
; One module per line; text after ';' is ignored.
java.base
java.compiler
java.datatransfer
java.desktop
java.instrument
java.logging
java.management
java.management.rmi
java.naming
java.net.http
java.prefs
java.rmi
java.scripting
java.se
java.security.jgss
java.security.sasl
java.smartcardio
java.sql
java.sql.rowset
java.transaction.xa
java.xml
java.xml.crypto
jdk.accessibility
jdk.charsets
jdk.crypto.cryptoki
jdk.crypto.ec
jdk.dynalink
jdk.httpserver
jdk.jfr
jdk.jsobject
jdk.localedata
jdk.management
jdk.management.jfr
jdk.naming.dns
jdk.naming.rmi
jdk.net
jdk.sctp
jdk.security.auth
jdk.security.jgss
jdk.unsupported
jdk.xml.dom
jdk.zipfs
";

const LAUNCHER_SH: &str = r#"#!/bin/sh
# APPLICATION_NAME launcher
APPDIR="$(cd "$(dirname "$0")" && pwd)"
cd "$APPDIR/LAUNCHER_APP_DIR" || exit 1
exec "$APPDIR/LAUNCHER_RUNTIME_DIR/bin/java" LAUNCHER_JVM_OPTIONS LAUNCHER_TARGET LAUNCHER_ARGUMENTS "$@"
"#;

const DEB_CONTROL: &str = "\
Package: APPLICATION_PACKAGE
Version: APPLICATION_VERSION
Section: DEPLOY_BUNDLE_CATEGORY
Maintainer: APPLICATION_MAINTAINER
Priority: optional
Architecture: APPLICATION_ARCH
Provides: APPLICATION_PACKAGE
Installed-Size: APPLICATION_INSTALLED_SIZE
Description: APPLICATION_SUMMARY
 APPLICATION_DESCRIPTION
";

const DEB_PREINST: &str = "\
#!/bin/sh
# preinst script for APPLICATION_PACKAGE
set -e

case \"$1\" in
    install|upgrade)
        if [ \"SERVICE_HINT\" = \"true\" ]; then
            if [ -x \"/etc/init.d/APPLICATION_PACKAGE\" ]; then
                /etc/init.d/APPLICATION_PACKAGE stop || true
            fi
        fi
    ;;
esac

exit 0
";

const DEB_PRERM: &str = "\
#!/bin/sh
# prerm script for APPLICATION_PACKAGE
set -e

case \"$1\" in
    remove|upgrade|deconfigure)
        xdg-desktop-menu uninstall --novendor /opt/APPLICATION_FS_NAME/APPLICATION_LAUNCHER_FILENAME.desktop || true
FILE_ASSOCIATION_REMOVE
SECONDARY_LAUNCHERS_REMOVE
        if [ \"SERVICE_HINT\" = \"true\" ] && [ \"STOP_ON_UNINSTALL\" = \"true\" ]; then
            /etc/init.d/APPLICATION_PACKAGE stop || true
        fi
    ;;
esac

exit 0
";

const DEB_POSTINST: &str = "\
#!/bin/sh
# postinst script for APPLICATION_PACKAGE
set -e

case \"$1\" in
    configure)
        xdg-desktop-menu install --novendor /opt/APPLICATION_FS_NAME/APPLICATION_LAUNCHER_FILENAME.desktop || true
FILE_ASSOCIATION_INSTALL
SECONDARY_LAUNCHERS_INSTALL
        if [ \"SERVICE_HINT\" = \"true\" ]; then
            if [ \"RUN_AT_STARTUP\" = \"true\" ]; then
                update-rc.d APPLICATION_PACKAGE defaults || true
            fi
            if [ \"START_ON_INSTALL\" = \"true\" ]; then
                /etc/init.d/APPLICATION_PACKAGE start || true
            fi
        fi
    ;;
esac

exit 0
";

const DEB_POSTRM: &str = "\
#!/bin/sh
# postrm script for APPLICATION_PACKAGE
set -e

case \"$1\" in
    purge|remove)
        if [ \"SERVICE_HINT\" = \"true\" ]; then
            update-rc.d -f APPLICATION_PACKAGE remove || true
        fi
    ;;
esac

exit 0
";

const DEB_COPYRIGHT: &str = "\
Copyright:

    APPLICATION_COPYRIGHT

License:

    APPLICATION_LICENSE_TEXT
";

const DEB_DESKTOP: &str = "\
[Desktop Entry]
Name=APPLICATION_NAME
Comment=APPLICATION_SUMMARY
Exec=/opt/APPLICATION_FS_NAME/APPLICATION_LAUNCHER_FILENAME
Icon=/opt/APPLICATION_FS_NAME/APPLICATION_LAUNCHER_FILENAME.png
Terminal=false
Type=Application
Categories=DEPLOY_BUNDLE_CATEGORY
DESKTOP_MIMES
";

const DEB_INIT: &str = "\
#!/bin/sh
### BEGIN INIT INFO
# Provides:          APPLICATION_PACKAGE
# Required-Start:    $local_fs $remote_fs $network
# Required-Stop:     $local_fs $remote_fs $network
# Default-Start:     2 3 4 5
# Default-Stop:      0 1 6
# Short-Description: APPLICATION_SUMMARY
### END INIT INFO

DAEMON=/opt/APPLICATION_FS_NAME/APPLICATION_LAUNCHER_FILENAME
PIDFILE=/var/run/APPLICATION_PACKAGE.pid

case \"$1\" in
    start)
        start-stop-daemon --start --background --make-pidfile --pidfile $PIDFILE --exec $DAEMON
    ;;
    stop)
        start-stop-daemon --stop --pidfile $PIDFILE --retry 10 || true
        rm -f $PIDFILE
    ;;
    restart|force-reload)
        $0 stop
        $0 start
    ;;
    *)
        echo \"Usage: $0 {start|stop|restart|force-reload}\"
        exit 1
    ;;
esac

exit 0
";

const BUILTIN: &[(&str, &str)] = &[
    ("redistributable.list", REDISTRIBUTABLE_LIST),
    ("launcher.sh", LAUNCHER_SH),
    ("template.control", DEB_CONTROL),
    ("template.preinst", DEB_PREINST),
    ("template.prerm", DEB_PRERM),
    ("template.postinst", DEB_POSTINST),
    ("template.postrm", DEB_POSTRM),
    ("template.copyright", DEB_COPYRIGHT),
    ("template.desktop", DEB_DESKTOP),
    ("template.init", DEB_INIT),
];

/// Shipped resource by default name.
pub fn lookup(name: &str) -> Option<(&'static str, &'static str)> {
    BUILTIN.iter().find(|(n, _)| *n == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_deb_template_is_shipped() {
        for name in [
            "control", "preinst", "prerm", "postinst", "postrm", "copyright", "desktop", "init",
        ] {
            assert!(lookup(&format!("template.{name}")).is_some(), "{name}");
        }
        assert!(lookup("template.rpm").is_none());
    }
}
