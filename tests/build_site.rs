use std::fs;
use std::path::Path;

use predicates::prelude::*;
use quire::build::build_site;
use quire::config::{Config, PROJECT_FILE};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const PROJECT: &str = "\
site:
  title: Field Notes
  base_url: https://example.org/notes/
  description: Things I wrote down
categories:
  - slug: guides
    name: Guides
    order: 2
  - slug: essays
    name: Essays
    order: 1
";

const LONG_POST: &str = "\
---
title: Reading Slowly
description: On taking your time
date: 2026-03-14
numberChapters: true
category: Long Reads
---
Some *opening* words.

## Why Bother
Because `it matters` and [links work](https://example.org/a_b_c).

### The Short Answer
1. first
2. second

### The Short Answer
> quoted

#### Detail
text

## Why Bother
```rust
fn main() {}
```
";

fn write(path: &Path, contents: &str) -> std::io::Result<()> {
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(path, contents)
}

fn post(date: &str) -> String {
    format!("---\ntitle: Short\ndescription: brief\ndate: {}\nshowContents: false\n---\nJust a paragraph.\n", date)
}

fn site(root: &Path) -> std::io::Result<()> {
    write(&root.join(PROJECT_FILE), PROJECT)?;
    write(&root.join("content/essays/reading-slowly/index.md"), LONG_POST)?;
    write(&root.join("content/essays/reading-slowly/figure.svg"), "<svg/>")?;
    write(&root.join("content/guides/short/index.md"), &post("2026-01-02"))?;
    write(&root.join("static/style.css"), "body { margin: 0 }")
}

#[test]
fn builds_pages_index_and_feed() -> TestResult {
    let dir = tempfile::tempdir()?;
    site(dir.path())?;
    let config = Config::from_project_file(&dir.path().join(PROJECT_FILE), None)?;
    build_site(&config)?;

    let out = dir.path().join("public");
    let page = fs::read_to_string(out.join("essays/reading-slowly/index.html"))?;
    assert!(page.contains("<title>Reading Slowly | Field Notes</title>"));
    assert!(page.contains("<time class=\"page-date\" datetime=\"2026-03-14\">March 14, 2026</time>"));
    assert!(page.contains("<p>Some <em>opening</em> words.</p>"));
    assert!(page.contains("<code>it matters</code>"));
    assert!(page.contains("<a href=\"https://example.org/a_b_c\">links work</a>"));
    assert!(page.contains("<section class=\"chapter\" id=\"chapter-why-bother\">"));
    assert!(page.contains("<section class=\"chapter\" id=\"chapter-why-bother-2\">"));
    assert!(page.contains("<h2>1. Why Bother</h2>"));
    assert!(page.contains("<h2>2. Why Bother</h2>"));
    assert!(page.contains("id=\"section-the-short-answer\""));
    assert!(page.contains("id=\"section-the-short-answer-2\""));
    assert!(page.contains("id=\"section-detail\""));
    assert!(page.contains("<a href=\"#chapter-why-bother-2\">"));
    assert!(page.contains("<pre><code class=\"language-rust\">fn main() {}"));
    assert!(page.contains("href=\"/notes/static/style.css\""));
    assert!(out.join("essays/reading-slowly/figure.svg").is_file());
    assert!(out.join("static/style.css").is_file());

    let short = fs::read_to_string(out.join("guides/short/index.html"))?;
    assert!(!short.contains("class=\"toc\""));

    let index: serde_json::Value = serde_json::from_str(&fs::read_to_string(out.join("posts.json"))?)?;
    assert_eq!("Reading Slowly", index[0]["title"]);
    assert_eq!("Long Reads", index[0]["category"]);
    assert_eq!("Essays", index[0]["categoryName"]);
    assert_eq!("/notes/essays/reading-slowly/", index[0]["url"]);
    assert_eq!("Short", index[1]["title"]);
    assert_eq!("guides", index[1]["category"]);
    assert_eq!(false, index[1]["showContents"]);

    let feed = fs::read_to_string(out.join("rss.xml"))?;
    assert!(feed.contains("<link>https://example.org/notes/essays/reading-slowly/</link>"));
    assert!(feed.contains("<pubDate>Sat, 14 Mar 2026 00:00:00 +0000</pubDate>"));
    assert!(feed.find("reading-slowly").unwrap() < feed.find("guides/short").unwrap());
    Ok(())
}

#[test]
fn cli_builds_site() -> TestResult {
    let dir = tempfile::tempdir()?;
    site(dir.path())?;
    let out = dir.path().join("elsewhere");

    assert_cmd::cargo::cargo_bin_cmd!("quire")
        .env("RUST_LOG", "info")
        .arg("build")
        .arg("--config")
        .arg(dir.path().join(PROJECT_FILE))
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("built site"));

    assert!(out.join("essays/reading-slowly/index.html").is_file());
    assert!(out.join("posts.json").is_file());
    assert!(out.join("rss.xml").is_file());
    assert!(!dir.path().join("public").exists());
    Ok(())
}

#[test]
fn cli_finds_project_file_in_parent_directory() -> TestResult {
    let dir = tempfile::tempdir()?;
    site(dir.path())?;

    assert_cmd::cargo::cargo_bin_cmd!("quire")
        .current_dir(dir.path().join("content/essays"))
        .arg("build")
        .assert()
        .success();

    assert!(dir.path().join("public/guides/short/index.html").is_file());
    Ok(())
}

#[test]
fn cli_reports_invalid_post_and_writes_nothing() -> TestResult {
    let dir = tempfile::tempdir()?;
    site(dir.path())?;
    write(
        &dir.path().join("content/guides/broken/index.md"),
        "---\ntitle: Broken\ndate: 2026-01-01\n---\nbody\n",
    )?;

    assert_cmd::cargo::cargo_bin_cmd!("quire")
        .arg("build")
        .arg("--config")
        .arg(dir.path().join(PROJECT_FILE))
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken").and(predicate::str::contains("description")));

    assert!(!dir.path().join("public").exists());
    Ok(())
}
