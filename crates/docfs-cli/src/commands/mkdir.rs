use docfs_core::FileSystem;
use docfs_remote::DocVfs;

pub async fn run(vfs: &DocVfs, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    vfs.mkdir(path).await?;
    println!("Created {}", path);

    Ok(())
}
