use anyhow::Result;

use super::build;
use super::help_text;
use super::launch_from_matches;
use crate::domain::models::PageContext;

#[test]
fn it_builds_launch_from_page_args() -> Result<()> {
    let matches = build().try_get_matches_from(vec![
        "pagechat",
        "--title",
        "Rust Book",
        "--url",
        "https://doc.rust-lang.org/book/",
        "--quote",
        "  Ownership is Rust's most unique feature. ",
    ])?;

    let launch = launch_from_matches(&matches);
    assert_eq!(launch.page.title, "Rust Book");
    assert_eq!(launch.page.url, "https://doc.rust-lang.org/book/");
    assert_eq!(launch.page.icon, "default-icon.png");
    assert_eq!(
        launch.quote.as_deref(),
        Some("  Ownership is Rust's most unique feature. ")
    );

    return Ok(());
}

#[test]
fn it_falls_back_to_page_defaults() -> Result<()> {
    let matches = build().try_get_matches_from(vec!["pagechat", "--quote", "   "])?;

    let launch = launch_from_matches(&matches);
    assert_eq!(launch.page, PageContext::default());
    assert!(launch.quote.is_none());

    return Ok(());
}

#[test]
fn it_rejects_unknown_line_policy() {
    let res = build().try_get_matches_from(vec!["pagechat", "--stream-line-policy", "middle"]);
    assert!(res.is_err());
}

#[test]
fn it_lists_commands_once_each() {
    let help = help_text();
    let quote_line = help
        .lines()
        .find(|line| return line.starts_with("- /quote"))
        .unwrap();

    insta::assert_snapshot!(quote_line, @"- /quote [TEXT] - Attaches TEXT as a quote to your next message, replacing any pending quote.");
}
