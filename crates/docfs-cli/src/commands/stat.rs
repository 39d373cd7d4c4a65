use docfs_core::{FileSize, FileSystem};
use docfs_remote::DocVfs;

pub async fn run(vfs: &DocVfs, path: &str, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let stats = vfs.stat(path).await?;

    println!("Path:     {}", path);
    println!("Type:     {}", if stats.is_directory { "directory" } else { "file" });
    match stats.size {
        FileSize::Known(bytes) => println!("Size:     {} bytes", bytes),
        FileSize::Pending => println!("Size:     (not loaded)"),
        FileSize::Unavailable => println!("Size:     (unavailable)"),
    }
    println!("Mode:     {:o}", stats.mode);
    println!("Modified: {}", stats.mtime.format("%Y-%m-%d %H:%M:%S UTC"));

    if verbose {
        if let Ok((fs, _)) = vfs.resolve(path) {
            let snapshot = fs.metrics().snapshot();
            println!();
            println!("Metrics:");
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            println!("Cache hit rate: {:.1}%", snapshot.cache_hit_rate());
        }
    }

    Ok(())
}
