use docfs_remote::DocVfs;

pub async fn run(vfs: &DocVfs) -> Result<(), Box<dyn std::error::Error>> {
    let mut failed = 0;
    for (alias, result) in vfs.ping_all().await {
        match result {
            Ok(()) => println!("{}: ok", alias),
            Err(err) => {
                failed += 1;
                println!("{}: {}", alias, err);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} mount(s) unreachable", failed).into());
    }
    Ok(())
}
