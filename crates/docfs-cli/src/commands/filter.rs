use docfs_core::{BatchOutcome, CategoryFilter};
use docfs_remote::DocVfs;

async fn open(vfs: &DocVfs, collection: &str) -> Result<CategoryFilter, Box<dyn std::error::Error>> {
    let (fs, relative) = vfs.resolve(collection)?;
    Ok(CategoryFilter::open(fs, &relative).await?)
}

fn report(outcome: &BatchOutcome) -> Result<(), Box<dyn std::error::Error>> {
    for entry in &outcome.patched {
        println!("updated {}", entry);
    }
    for entry in &outcome.skipped {
        println!("unchanged {}", entry);
    }
    for (entry, err) in &outcome.failed {
        eprintln!("failed {}: {}", entry, err);
    }

    if outcome.is_complete() {
        Ok(())
    } else {
        Err(format!("{} update(s) failed", outcome.failed.len()).into())
    }
}

/// Merge labels into the category of each entry. Without labels, print the
/// category the entries share, if any.
pub async fn tag(
    vfs: &DocVfs,
    collection: &str,
    entries: &[String],
    labels: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut filter = open(vfs, collection).await?;

    match labels {
        Some(labels) => {
            let outcome = filter.set_category(entries, &labels).await?;
            report(&outcome)
        }
        None => {
            match filter.suggested_category(entries).await {
                Some(category) => println!("{}", category),
                None => println!("(no shared category)"),
            }
            Ok(())
        }
    }
}

pub async fn dismiss(
    vfs: &DocVfs,
    collection: &str,
    entries: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut filter = open(vfs, collection).await?;
    let outcome = filter.dismiss(entries).await;
    report(&outcome)
}

/// List a collection with the requested hide toggles switched on.
pub async fn hide(
    vfs: &DocVfs,
    collection: &str,
    categorized: bool,
    dismissed: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut filter = open(vfs, collection).await?;

    if categorized {
        filter.set_hide_categorized(true).await?;
    }
    if dismissed {
        filter.set_hide_dismissed(true).await?;
    }

    let visible = filter.visible();
    if visible.is_empty() {
        println!("(empty)");
    }
    for name in visible {
        println!("{}", name);
    }
    let hidden = filter.hidden().len();
    if hidden > 0 {
        println!("({} hidden)", hidden);
    }

    Ok(())
}
