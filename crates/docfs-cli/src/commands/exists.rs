use docfs_core::FileSystem;
use docfs_remote::DocVfs;

/// Exit code 0 if the path exists, 1 if not.
pub async fn run(vfs: &DocVfs, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if vfs.exists(path).await {
        println!("{} exists", path);
        std::process::exit(0);
    } else {
        println!("{} does not exist", path);
        std::process::exit(1);
    }
}
