//! CPU architecture types and utilities.

/// CPU architecture of the host the image is assembled on.
///
/// The embedded runtime is copied from the host's module path, so the image
/// always targets the host architecture.
///
/// # Examples
///
/// ```no_run
/// use runtime_bundler::bundler::platform::Arch;
///
/// let arch = Arch::current();
/// println!("Packaging for {} ({})", arch, arch.deb_name());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    X86_64,
    /// x86 / i686 (32-bit)
    X86,
    /// AArch64 / ARM64 (64-bit)
    AArch64,
    /// ARM with hard-float (32-bit)
    Armhf,
    /// RISC-V (64-bit)
    Riscv64,
    /// Anything else
    Other,
}

impl Arch {
    /// Architecture of the running process.
    pub fn current() -> Self {
        match std::env::consts::ARCH {
            "x86_64" => Self::X86_64,
            "x86" => Self::X86,
            "aarch64" => Self::AArch64,
            "arm" => Self::Armhf,
            "riscv64" => Self::Riscv64,
            _ => Self::Other,
        }
    }

    /// Name as reported by `std::env::consts::ARCH`; used in resource qualifiers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::X86 => "x86",
            Self::AArch64 => "aarch64",
            Self::Armhf => "arm",
            Self::Riscv64 => "riscv64",
            Self::Other => std::env::consts::ARCH,
        }
    }

    /// Debian architecture name.
    pub fn deb_name(&self) -> &'static str {
        match self {
            Self::X86_64 => "amd64",
            Self::X86 => "i386",
            Self::AArch64 => "arm64",
            Self::Armhf => "armhf",
            Self::Riscv64 => "riscv64",
            Self::Other => "all",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deb_names() {
        assert_eq!(Arch::X86_64.deb_name(), "amd64");
        assert_eq!(Arch::X86.deb_name(), "i386");
        assert_eq!(Arch::AArch64.deb_name(), "arm64");
    }

    #[test]
    fn test_current_round_trips_consts() {
        let arch = Arch::current();
        if arch != Arch::Other {
            assert_eq!(arch.as_str(), std::env::consts::ARCH);
        }
    }
}
