//! End-to-end tests of the Fedora 8 setup sequence against a scratch root.

mod helpers;

use helpers::{MockExecutor, NodeRoot, mode};
use nodestrap::NodestrapError;
use nodestrap::platform::fedora8::jdk_release;
use nodestrap::platform::{Architecture, OsFamily, Platform, PlatformDescriptor};
use nodestrap::properties::{ARCH_KEY, JAVA_HOME_KEY, PACKAGE_BUCKET_KEY, Properties};
use nodestrap::provision::{ServiceAccount, SetupContext, SetupOptions};

fn properties(arch: &str) -> Properties {
    [(ARCH_KEY, arch)].into_iter().collect()
}

/// Selects the platform for `props`, derives its properties and runs setup.
fn run_setup(
    executor: &MockExecutor,
    root: &NodeRoot,
    mut props: Properties,
    options: SetupOptions,
) -> anyhow::Result<Properties> {
    let descriptor = PlatformDescriptor::resolve(OsFamily::Fedora8, &props)?;
    let platform = Platform::select(descriptor, &props);
    let setup = platform.as_setup();
    setup.init_properties(&mut props);
    let ctx = SetupContext::new(executor, options).with_root(root.path.clone());
    setup.setup(&props, &ctx)?;
    Ok(props)
}

#[test]
fn fresh_node_runs_steps_in_order() {
    let root = NodeRoot::new();
    let executor = MockExecutor::fresh_node();

    run_setup(&executor, &root, properties("x86_64"), SetupOptions::default()).unwrap();

    let ordered = [
        "wget -q -O",
        "tar -xzf",
        "s3cmd.rb get",
        "yum -y install yum-allowdowngrade",
        "rpm -qa 'java-*-icedtea'",
        "yum -y install compat-libstdc++-33 compat-libstdc++-296",
        "chmod 0700",
        "bin/no.more",
        "-noregister",
        "yum -y install screen lzo xeyes xauth xml-commons-apis",
        "getent passwd hadoop",
        "useradd --create-home hadoop",
        "getent passwd client",
        "useradd --create-home client",
    ];
    let positions: Vec<usize> = ordered
        .iter()
        .map(|needle| {
            executor
                .position(needle)
                .unwrap_or_else(|| panic!("command containing {:?} was not run", needle))
        })
        .collect();
    assert!(
        positions.windows(2).all(|w| w[0] < w[1]),
        "commands ran out of order: {:#?}",
        executor.calls()
    );
}

#[test]
fn fresh_node_files_are_written() {
    let root = NodeRoot::new();
    let executor = MockExecutor::fresh_node();

    run_setup(&executor, &root, properties("x86_64"), SetupOptions::default()).unwrap();

    assert!(root.read("etc/profile").contains("\nexport JAVA_HOME=/usr/java/jdk1.6.0_07\n"));
    assert!(root.read("etc/sudoers").contains(
        "Defaults  env_keep += \"JAVA_HOME HADOOPDIR HADOOP_HOME PIGDIR PIG_CLASSPATH\""
    ));
    assert!(root.read("root/.ssh/config").contains("StrictHostKeyChecking no"));

    for user in ["hadoop", "client"] {
        let home = root.join(&format!("home/{}", user));
        assert_eq!(mode(&home), 0o755, "home of {}", user);
        assert_eq!(mode(&home.join(".ssh")), 0o700, ".ssh of {}", user);
        assert_eq!(mode(&home.join(".ssh/id_rsa")), 0o600);
        assert_eq!(mode(&home.join(".ssh/authorized_keys")), 0o600);
        assert_eq!(
            root.read(&format!("home/{}/.ssh/authorized_keys", user)),
            "ssh-rsa AAAA root@driver\n"
        );
        assert!(root.read(&format!("home/{}/.ssh/config", user)).contains("GSSAPIAuthentication no"));
        assert_eq!(executor.count(&format!("chown -R {0}:{0}", user)), 1);
    }
}

#[test]
fn existing_content_is_appended_not_clobbered() {
    let root = NodeRoot::new();
    std::fs::write(root.join("etc/profile"), "# distro profile\n").unwrap();
    std::fs::write(root.join("etc/sudoers"), "root ALL=(ALL) ALL\n").unwrap();
    let executor = MockExecutor::fresh_node();

    run_setup(&executor, &root, properties("i386"), SetupOptions::default()).unwrap();

    let profile = root.read("etc/profile");
    assert!(profile.starts_with("# distro profile\n"));
    assert!(profile.ends_with("export JAVA_HOME=/usr/java/jdk1.6.0_10\n"));
    assert!(root.read("etc/sudoers").starts_with("root ALL=(ALL) ALL\n"));
}

#[test]
fn architecture_selects_jdk_release() {
    for (arch, selector) in [(Architecture::X86_64, "x86_64"), (Architecture::I386, "i386")] {
        let root = NodeRoot::new();
        let executor = MockExecutor::fresh_node();
        let jdk = jdk_release(arch);

        let props = run_setup(&executor, &root, properties(selector), SetupOptions::default()).unwrap();

        assert_eq!(props.get(JAVA_HOME_KEY), Some(jdk.home));
        let fetch = format!("hadoop-node-packages:packages/{}", jdk.installer);
        assert_eq!(executor.count(&fetch), 1, "calls: {:#?}", executor.calls());
        assert_eq!(executor.count(&format!("{}' -noregister", jdk.installer)), 1);
    }
    assert_ne!(jdk_release(Architecture::X86_64), jdk_release(Architecture::I386));
}

#[test]
fn package_bucket_property_is_used() {
    let root = NodeRoot::new();
    let executor = MockExecutor::fresh_node();
    let mut props = properties("x86_64");
    props.set(PACKAGE_BUCKET_KEY, "site-packages");

    run_setup(&executor, &root, props, SetupOptions::default()).unwrap();

    assert_eq!(executor.count("s3cmd.rb get site-packages:packages/"), 1);
}

#[test]
fn existing_accounts_are_not_recreated() {
    let root = NodeRoot::new();
    let executor = MockExecutor::new().failing("rpm -qa");

    run_setup(&executor, &root, properties("x86_64"), SetupOptions::default()).unwrap();

    assert_eq!(executor.count("getent passwd"), 2);
    assert_eq!(executor.count("useradd"), 0);
}

#[test]
fn installed_conflicting_packages_are_removed() {
    let root = NodeRoot::new();
    let executor = MockExecutor::new().failing("getent passwd");

    run_setup(&executor, &root, properties("x86_64"), SetupOptions::default()).unwrap();

    assert_eq!(executor.count("yum -y remove"), 3);
    assert_eq!(executor.count("yum -y remove java-*-icedtea-plugin"), 1);
}

#[test]
fn missing_conflicting_packages_are_not_removed() {
    let root = NodeRoot::new();
    let executor = MockExecutor::fresh_node();

    run_setup(&executor, &root, properties("x86_64"), SetupOptions::default()).unwrap();

    assert_eq!(executor.count("rpm -qa"), 3);
    assert_eq!(executor.count("yum -y remove"), 0);
}

#[test]
fn command_failure_aborts_remaining_steps() {
    let root = NodeRoot::new();
    let executor = MockExecutor::fresh_node().failing("compat-libstdc++");

    let err = run_setup(&executor, &root, properties("x86_64"), SetupOptions::default()).unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("setup step 5/11"), "unexpected error: {}", message);
    assert!(message.contains("yum -y install compat-libstdc++-33"), "unexpected error: {}", message);
    let typed = err.downcast_ref::<NodestrapError>();
    assert!(matches!(typed, Some(NodestrapError::Execution { .. })), "got {:?}", typed);

    assert_eq!(executor.count("-noregister"), 0);
    assert_eq!(executor.count("useradd"), 0);
    assert!(!root.join("etc/sudoers").exists());
    assert!(!root.join("etc/profile").exists());
}

#[test]
fn pager_is_restored_when_installer_fails() {
    let root = NodeRoot::new();
    let executor = MockExecutor::fresh_node().failing("-noregister");

    let err = run_setup(&executor, &root, properties("x86_64"), SetupOptions::default()).unwrap_err();

    assert!(format!("{:#}", err).contains("setup step 6/11 (install JDK) failed"));
    let pager = root.join("bin/more");
    let parked = root.join("bin/no.more");
    let calls = executor.calls();
    assert_eq!(calls.last().unwrap(), &format!("mv {} {}", parked, pager));
    assert_eq!(executor.count(&format!("mv {} {}", pager, parked)), 1);
}

#[test]
fn env_keep_comes_from_options() {
    let root = NodeRoot::new();
    let executor = MockExecutor::fresh_node();
    let options = SetupOptions {
        env_keep: vec!["HADOOP_CONF_DIR".to_string(), "JAVA_HOME".to_string()],
        ..SetupOptions::default()
    };

    run_setup(&executor, &root, properties("x86_64"), options).unwrap();

    assert!(root.read("etc/sudoers").contains("env_keep += \"JAVA_HOME HADOOP_CONF_DIR\""));
}

#[test]
fn accounts_without_root_keys_get_no_key_copies() {
    let root = NodeRoot::new();
    let executor = MockExecutor::fresh_node();
    let options = SetupOptions {
        service_accounts: vec![ServiceAccount::new("mapred").without_root_keys()],
        ..SetupOptions::default()
    };

    run_setup(&executor, &root, properties("x86_64"), options).unwrap();

    assert!(root.join("home/mapred/.ssh/config").exists());
    assert!(!root.join("home/mapred/.ssh/id_rsa").exists());
    assert!(!root.join("home/mapred/.ssh/authorized_keys").exists());
    assert_eq!(executor.count("useradd --create-home mapred"), 1);
}

#[test]
fn dry_run_writes_no_files() {
    let root = NodeRoot::new();
    let executor = MockExecutor::fresh_node();
    let mut props = properties("x86_64");
    let descriptor = PlatformDescriptor::resolve(OsFamily::Fedora8, &props).unwrap();
    let platform = Platform::select(descriptor, &props);
    platform.as_setup().init_properties(&mut props);
    let ctx = SetupContext::new(&executor, SetupOptions::default())
        .with_root(root.path.clone())
        .with_dry_run(true);

    platform.as_setup().setup(&props, &ctx).unwrap();

    assert!(!root.join("etc/profile").exists());
    assert!(!root.join("etc/sudoers").exists());
    assert!(!root.join("home").exists());
}

#[test]
fn setup_without_derived_properties_fails_before_any_command() {
    let root = NodeRoot::new();
    let executor = MockExecutor::fresh_node();
    let props = properties("x86_64");
    let descriptor = PlatformDescriptor::resolve(OsFamily::Fedora8, &props).unwrap();
    let platform = Platform::select(descriptor, &props);
    let ctx = SetupContext::new(&executor, SetupOptions::default()).with_root(root.path.clone());

    let err = platform.as_setup().setup(&props, &ctx).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<NodestrapError>(),
        Some(NodestrapError::MissingProperty(key)) if key == JAVA_HOME_KEY
    ));
    assert!(executor.calls().is_empty());
}

#[test]
fn remote_bootstrap_uses_default_package_manager_only() {
    let props = properties("i386");
    let descriptor = PlatformDescriptor::resolve(OsFamily::Fedora8, &props).unwrap();
    let platform = Platform::select(descriptor, &props);

    let commands = platform.as_setup().remote_bootstrap();

    assert_eq!(commands, ["yum -y install python python-devel ruby rsync"]);
}

#[test]
fn init_properties_only_touches_java_home() {
    let mut props = properties("x86_64");
    props.set(PACKAGE_BUCKET_KEY, "b");
    let before = props.clone();
    let descriptor = PlatformDescriptor::resolve(OsFamily::Fedora8, &props).unwrap();
    let platform = Platform::select(descriptor, &props);

    platform.as_setup().init_properties(&mut props);

    assert_eq!(props.iter().count(), before.iter().count() + 1);
    assert_eq!(props.get(JAVA_HOME_KEY), Some("/usr/java/jdk1.6.0_07"));
    assert_eq!(props.get(PACKAGE_BUCKET_KEY), Some("b"));
}

#[test]
fn downgrade_plugin_is_installed_before_java_removal() {
    let root = NodeRoot::new();
    let executor = MockExecutor::new().failing("getent passwd");

    run_setup(&executor, &root, properties("x86_64"), SetupOptions::default()).unwrap();

    let plugin = executor.position("yum -y install yum-allowdowngrade").unwrap();
    let first_removal = executor.position("yum -y remove").unwrap();
    assert!(plugin < first_removal, "calls: {:#?}", executor.calls());
    assert_eq!(executor.count("yum-allowdowngrade"), 1);
}

#[test]
fn paths_with_spaces_are_quoted_in_shell_steps() {
    let root = NodeRoot::new();
    let executor = MockExecutor::fresh_node();
    let options = SetupOptions {
        staging_dir: "/mnt/node packages".into(),
        ..SetupOptions::default()
    };

    run_setup(&executor, &root, properties("x86_64"), options).unwrap();

    let staging = root.join("mnt/node packages");
    let copy = format!("cp '{}/s3sync'/*.rb '{}'", staging, root.join("usr/bin"));
    assert_eq!(executor.count(&copy), 1, "calls: {:#?}", executor.calls());
    let install = format!(
        "yes | '{}' -noregister",
        staging.join(jdk_release(Architecture::X86_64).installer)
    );
    assert_eq!(executor.count(&install), 1, "calls: {:#?}", executor.calls());
}
