use std::io::{self, Read};

use docfs_core::FileSystem;
use docfs_remote::DocVfs;

pub async fn run(
    vfs: &DocVfs,
    path: &str,
    content: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = match content {
        Some(c) => c.into_bytes(),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            buffer
        }
    };

    vfs.write_file(path, &data).await?;
    println!("Wrote {} bytes to {}", data.len(), path);

    Ok(())
}
