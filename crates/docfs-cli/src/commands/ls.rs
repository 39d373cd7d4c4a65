use docfs_core::FileSystem;
use docfs_remote::DocVfs;

pub async fn run(vfs: &DocVfs, path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.as_deref().unwrap_or("/");

    let entries = vfs.readdir(path).await?;

    if entries.is_empty() {
        println!("(empty)");
        return Ok(());
    }

    for name in entries {
        let child = format!("{}/{}", path.trim_end_matches('/'), name);
        if !vfs.is_document(&child) {
            println!("d {}", name);
            continue;
        }

        // the listing just populated the cache for this collection
        let category = match vfs.resolve(&child) {
            Ok((fs, relative)) => fs.cached_category(&relative).await,
            Err(_) => None,
        };
        match category {
            Some(category) => println!("- {}  [{}]", name, category),
            None => println!("- {}", name),
        }
    }

    Ok(())
}
