use docfs_core::{FileContents, FileSystem, TextEncoding};
use docfs_remote::DocVfs;

pub async fn run(
    vfs: &DocVfs,
    path: &str,
    encoding: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let encoding = match encoding {
        Some(name) => name.parse::<TextEncoding>()?,
        None => TextEncoding::Utf8,
    };

    match vfs.read_file(path, Some(encoding)).await? {
        FileContents::Text(text) => println!("{}", text),
        FileContents::Bytes(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
    }

    Ok(())
}
