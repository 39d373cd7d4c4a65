use docfs_remote::DocVfs;

pub async fn run(vfs: &DocVfs) -> Result<(), Box<dyn std::error::Error>> {
    // connection strings print redacted
    let yaml = vfs.effective_config().to_yaml()?;
    println!("{}", yaml);

    Ok(())
}
