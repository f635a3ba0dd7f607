//! Fedora Core 8 setup, for both i386 and x86_64.

use anyhow::{Context, Result};
use camino::Utf8Path;
use tracing::info;

use super::{Architecture, PlatformSetup};
use crate::executor::{CommandSpec, shell_quote};
use crate::properties::{JAVA_HOME_KEY, PACKAGE_BUCKET_DEFAULT, PACKAGE_BUCKET_KEY, Properties};
use crate::provision::package::{install_packages, remove_packages};
use crate::provision::shadow::with_program_shadowed;
use crate::provision::{SetupContext, Yum, account, environment, fetch, ssh, step};

const SETUP_STEPS: usize = 11;

/// Pre-installed Java runtimes that conflict with the Sun JDK.
const CONFLICTING_PACKAGES: &[&str] =
    &["java-*-icedtea", "java-*-icedtea-devel", "java-*-icedtea-plugin"];

/// yum plugin installed ahead of the Java package removal.
const DOWNGRADE_PLUGIN: &[&str] = &["yum-allowdowngrade"];

/// Libraries the JDK installer needs.
const COMPAT_PACKAGES: &[&str] = &["compat-libstdc++-33", "compat-libstdc++-296"];

/// Utilities that make the node usable for operators and tests.
const UTILITY_PACKAGES: &[&str] = &["screen", "lzo", "xeyes", "xauth", "xml-commons-apis"];

/// Pager the JDK installer shows its license through.
const LICENSE_PAGER: &str = "/bin/more";

/// JDK build used for an architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JdkRelease {
    /// Where the installer puts the JDK; becomes `JAVA_HOME`.
    pub home: &'static str,
    /// Self-extracting installer name, stored under `packages/` in the bucket.
    pub installer: &'static str,
}

/// Looks up the JDK release for `arch`.
pub fn jdk_release(arch: Architecture) -> JdkRelease {
    match arch {
        Architecture::X86_64 => JdkRelease {
            home: "/usr/java/jdk1.6.0_07",
            installer: "jdk-6u7-linux-x86_64-rpm.bin",
        },
        Architecture::I386 => JdkRelease {
            home: "/usr/java/jdk1.6.0_10",
            installer: "jdk-6u10-linux-i386-rpm.bin",
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fedora8Setup {
    arch: Architecture,
    bucket: String,
}

impl Fedora8Setup {
    pub fn new(arch: Architecture, properties: &Properties) -> Self {
        Self {
            arch,
            bucket: properties
                .get_or(PACKAGE_BUCKET_KEY, PACKAGE_BUCKET_DEFAULT)
                .to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn fetch_jdk(&self, ctx: &SetupContext<'_>, installer: &Utf8Path) -> Result<()> {
        let jdk = jdk_release(self.arch);
        fetch::bucket_get(ctx, &self.bucket, &format!("packages/{}", jdk.installer), installer)
    }

    fn install_jdk(&self, ctx: &SetupContext<'_>, installer: &Utf8Path) -> Result<()> {
        ctx.run(&CommandSpec::new("chmod", ["0700", installer.as_str()]))?;
        let pager = ctx.path(LICENSE_PAGER);
        with_program_shadowed(ctx.executor(), &pager, || {
            info!("running JDK installer {}", installer);
            let script = format!("yes | {} -noregister", shell_quote(installer.as_str()));
            ctx.run(&CommandSpec::shell(script))
        })
    }

    fn configure_root_ssh(&self, ctx: &SetupContext<'_>) -> Result<()> {
        ssh::write_client_config(ctx, &ctx.path("/root/.ssh"))?;
        Ok(())
    }

    fn provision_accounts(&self, ctx: &SetupContext<'_>) -> Result<()> {
        for account in &ctx.options().service_accounts {
            account::provision_account(ctx, account)
                .with_context(|| format!("failed to provision account {}", account.name))?;
        }
        Ok(())
    }
}

impl PlatformSetup for Fedora8Setup {
    fn name(&self) -> &'static str {
        "fedora8"
    }

    fn remote_bootstrap(&self) -> Vec<String> {
        // python for the setup tooling, ruby for the s3sync tools
        vec!["yum -y install python python-devel ruby rsync".to_string()]
    }

    fn init_properties(&self, properties: &mut Properties) {
        properties.set(JAVA_HOME_KEY, jdk_release(self.arch).home);
    }

    fn setup(&self, properties: &Properties, ctx: &SetupContext<'_>) -> Result<()> {
        let java_home = properties.require(JAVA_HOME_KEY)?;
        let installer = ctx.staging_dir().join(jdk_release(self.arch).installer);
        let yum = Yum;

        info!("provisioning {} node ({})", self.name(), self.arch);

        step(1, SETUP_STEPS, "fetch artifact tools", || fetch::install_artifact_tools(ctx))?;
        step(2, SETUP_STEPS, "fetch JDK installer", || self.fetch_jdk(ctx, &installer))?;
        step(3, SETUP_STEPS, "install yum downgrade plugin", || {
            install_packages(ctx, &yum, DOWNGRADE_PLUGIN)
        })?;
        step(4, SETUP_STEPS, "remove conflicting Java packages", || {
            remove_packages(ctx, &yum, CONFLICTING_PACKAGES).map(drop)
        })?;
        step(5, SETUP_STEPS, "install compatibility libraries", || {
            install_packages(ctx, &yum, COMPAT_PACKAGES)
        })?;
        step(6, SETUP_STEPS, "install JDK", || self.install_jdk(ctx, &installer))?;
        step(7, SETUP_STEPS, "export JAVA_HOME", || {
            Ok(environment::export_java_home(ctx, java_home)?)
        })?;
        step(8, SETUP_STEPS, "install utility packages", || {
            install_packages(ctx, &yum, UTILITY_PACKAGES)
        })?;
        step(9, SETUP_STEPS, "configure root ssh client", || self.configure_root_ssh(ctx))?;
        step(10, SETUP_STEPS, "provision service accounts", || self.provision_accounts(ctx))?;
        step(11, SETUP_STEPS, "preserve environment across sudo", || {
            Ok(environment::preserve_env_for_sudo(ctx)?)
        })?;

        info!("{} node provisioned", self.name());
        Ok(())
    }
}
