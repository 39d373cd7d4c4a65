use docfs_core::FileSystem;
use docfs_remote::DocVfs;

pub async fn run(vfs: &DocVfs, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    vfs.unlink(path).await?;
    println!("Deleted {}", path);

    Ok(())
}

pub async fn run_dir(vfs: &DocVfs, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    vfs.rmdir(path).await?;
    println!("Dropped {}", path);

    Ok(())
}
