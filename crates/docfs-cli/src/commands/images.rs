use docfs_remote::DocVfs;

pub async fn run(vfs: &DocVfs, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !vfs.is_document(path) {
        return Err(format!("{} is not a document", path).into());
    }

    let images = vfs.get_document_images(path).await;
    if images.is_empty() {
        println!("(no images)");
    }
    for url in images {
        println!("{}", url);
    }

    Ok(())
}
