//! Access to java toolchains

use assemble_core::lazy_evaluation::anonymous::AnonymousProvider;
use assemble_core::lazy_evaluation::{IntoProvider, Provider};
use assemble_core::provider;
use std::env::consts::EXE_SUFFIX;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::{fs, io};

/// The file in the root of a java installation that describes it
pub const RELEASE_FILE: &str = "release";

/// Describes which java installation should be used
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JavaToolchainSpec {
    /// The major version of java the installation must provide
    #[serde(default)]
    pub language_version: Option<u32>,
    /// The home directory of a specific installation
    #[serde(default)]
    pub installation: Option<PathBuf>,
}

impl JavaToolchainSpec {
    /// A spec that accepts an installation of some major version
    pub fn with_version(language_version: u32) -> Self {
        Self {
            language_version: Some(language_version),
            installation: None,
        }
    }
}

impl Display for JavaToolchainSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.language_version, &self.installation) {
            (Some(version), Some(home)) => write!(f, "java {} at {:?}", version, home),
            (Some(version), None) => write!(f, "java {}", version),
            (None, Some(home)) => write!(f, "java at {:?}", home),
            (None, None) => write!(f, "any java"),
        }
    }
}

/// An error occurred while looking for a java installation
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// Neither `JAVA_HOME` nor the `PATH` point to an installation
    #[error("No java installation could be found. Set JAVA_HOME or add javac to the PATH")]
    NoInstallation,
    /// The directory has no java compiler
    #[error("{0:?} is not a java installation, it has no javac")]
    NotAnInstallation(PathBuf),
    /// The installation is not the required version
    #[error("Java installation at {home:?} has version {found:?}, but version {expected} is required")]
    VersionMismatch {
        /// The home directory of the installation
        home: PathBuf,
        /// The required major version
        expected: u32,
        /// The major version of the installation, if known
        found: Option<u32>,
    },
    /// An io error occurred while inspecting an installation
    #[error(transparent)]
    IoError(#[from] io::Error),
}

/// Describes a java installation
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct JavaInstallationMetadata {
    /// The home directory of the installation
    pub installation_path: PathBuf,
    /// The full version of the installation, from its release file
    pub java_runtime_version: Option<String>,
    /// The major version of the installation
    pub language_version: Option<u32>,
}

/// A java installation on this machine
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct JavaInstallation {
    metadata: JavaInstallationMetadata,
}

impl JavaInstallation {
    /// Inspects the installation at a home directory. The directory must contain `bin/javac`.
    pub fn at(home: impl AsRef<Path>) -> Result<Self, ToolchainError> {
        let home = home.as_ref();
        if !javac_in(home).is_file() {
            return Err(ToolchainError::NotAnInstallation(home.to_path_buf()));
        }
        let java_runtime_version = match fs::read_to_string(home.join(RELEASE_FILE)) {
            Ok(release) => release_property(&release, "JAVA_VERSION"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        let language_version = java_runtime_version.as_deref().and_then(major_version);
        Ok(Self {
            metadata: JavaInstallationMetadata {
                installation_path: home.to_path_buf(),
                java_runtime_version,
                language_version,
            },
        })
    }

    /// The home directory of this installation
    pub fn home(&self) -> &Path {
        &self.metadata.installation_path
    }

    /// The metadata of this installation
    pub fn metadata(&self) -> &JavaInstallationMetadata {
        &self.metadata
    }

    /// The java compiler of this installation
    pub fn compiler(&self) -> JavaCompiler {
        JavaCompiler {
            executable_path: javac_in(self.home()),
            metadata: self.metadata.clone(),
        }
    }
}

/// The java compiler of an installation
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct JavaCompiler {
    /// The path of the `javac` executable
    pub executable_path: PathBuf,
    /// The installation the compiler belongs to
    pub metadata: JavaInstallationMetadata,
}

fn javac_in(home: &Path) -> PathBuf {
    home.join("bin").join(format!("javac{}", EXE_SUFFIX))
}

/// Reads a `KEY="value"` line from a release file
fn release_property(release: &str, key: &str) -> Option<String> {
    release.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        (k.trim() == key).then(|| v.trim().trim_matches('"').to_string())
    })
}

/// The major version of a java version string. Legacy versions such as `1.8.0_292` are major
/// version 8.
fn major_version(version: &str) -> Option<u32> {
    let mut parts = version.split(|c: char| !c.is_ascii_digit());
    match parts.next()?.parse::<u32>().ok()? {
        1 => parts.next()?.parse().ok(),
        major => Some(major),
    }
}

/// Finds java installations that match toolchain specs.
///
/// Installations are looked for in this order:
/// 1. The installation set in the spec
/// 2. `JAVA_HOME`
/// 3. The `javac` on the `PATH`, following symlinks
#[derive(Debug, Clone, Default)]
pub struct JavaToolchainService {
    java_home: Option<PathBuf>,
    search_path: Option<OsString>,
}

impl JavaToolchainService {
    /// Creates a service that looks at the environment of this process
    pub fn new() -> Self {
        Self {
            java_home: std::env::var_os("JAVA_HOME")
                .filter(|home| !home.is_empty())
                .map(PathBuf::from),
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Creates a service with an explicit `JAVA_HOME` and `PATH`
    pub fn with_environment(java_home: Option<PathBuf>, search_path: Option<OsString>) -> Self {
        Self {
            java_home,
            search_path,
        }
    }

    /// Finds the installation matching a spec
    pub fn resolve(&self, spec: &JavaToolchainSpec) -> Result<JavaInstallation, ToolchainError> {
        let home = match &spec.installation {
            Some(home) => home.clone(),
            None => self.locate_home()?,
        };
        let installation = JavaInstallation::at(&home)?;
        if let Some(expected) = spec.language_version {
            let found = installation.metadata().language_version;
            if found != Some(expected) {
                return Err(ToolchainError::VersionMismatch {
                    home,
                    expected,
                    found,
                });
            }
        }
        debug!("resolved {} to {:?}", spec, installation.home());
        Ok(installation)
    }

    fn locate_home(&self) -> Result<PathBuf, ToolchainError> {
        if let Some(home) = &self.java_home {
            return Ok(home.clone());
        }
        let cwd = std::env::current_dir()?;
        let javac = which::which_in("javac", self.search_path.as_ref(), cwd)
            .map_err(|_| ToolchainError::NoInstallation)?;
        let javac = fs::canonicalize(javac)?;
        javac
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .ok_or(ToolchainError::NoInstallation)
    }

    /// Gets a provider of the compiler matching a spec. The installation is only looked for when
    /// the provider is queried. The provider has no value if no installation matches.
    pub fn compiler_for<P>(&self, spec: P) -> AnonymousProvider<JavaCompiler>
    where
        P: IntoProvider<JavaToolchainSpec>,
        P::Provider: 'static,
    {
        let spec = spec.into_provider();
        let service = self.clone();
        AnonymousProvider::new(provider!(move || {
            let spec = spec.try_get()?;
            match service.resolve(&spec) {
                Ok(installation) => Some(installation.compiler()),
                Err(e) => {
                    debug!("no compiler for {}: {}", spec, e);
                    None
                }
            }
        }))
    }
}
