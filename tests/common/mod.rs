use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

static NEXT_DIR_ID: AtomicUsize = AtomicUsize::new(1);

fn test_temp_dir_path() -> PathBuf {
    let tmpdir = std::env::temp_dir();
    loop {
        let val = NEXT_DIR_ID.fetch_add(1, Ordering::SeqCst);
        let path = tmpdir.join(format!("vmw-tax-test-{}-{}", std::process::id(), val));
        if !path.exists() {
            return path;
        }
    }
}

/// A fresh directory under the system temp dir, removed on drop.
pub struct TestDir {
    pub path: PathBuf,
}

impl TestDir {
    pub fn new() -> TestDir {
        let path = test_temp_dir_path();
        fs::create_dir_all(&path).unwrap();
        TestDir { path }
    }

    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let p = self.path.join(name);
        fs::write(&p, contents).unwrap();
        p
    }
}

fn cleanup_test_dir(path: &Path) {
    if !path.exists() {
        return;
    }
    let skip_env_var = "SKIP_TEMP_DIR_CLEANUP_ON_FAIL";
    let skip_del_on_fail = vmw_tax::util::sys::env_var_non_empty(skip_env_var);

    if std::thread::panicking() && skip_del_on_fail {
        println!("cleanup_test_dir: panicking. Skipping remove of {}", path.display());
    } else {
        println!("cleanup_test_dir: removing {}. To skip cleanup on failure, set {}",
                 path.display(), skip_env_var);
        let _ = fs::remove_dir_all(path);
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        cleanup_test_dir(&self.path);
    }
}

pub fn test_data_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data").join(name)
}
