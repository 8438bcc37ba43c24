// README-to-rustdoc helper shared by the crate build scripts.
// Include with: include!("../build_common.rs");
//
// The including file must import std::env, std::fs and std::path::Path.

/// Write `README_GENERATED.md` into `OUT_DIR` for `#![doc = include_str!(..)]`.
///
/// Source links such as `[x](src/engines/mod.rs)` become intra-doc links
/// (`crate::engines`). A missing README yields an empty crate doc.
fn process_readme_for_rustdoc(crate_dir: &str) {
    println!("cargo:rerun-if-changed=README.md");

    let content = fs::read_to_string(Path::new(crate_dir).join("README.md")).unwrap_or_default();

    let out_dir = env::var("OUT_DIR").unwrap();
    fs::write(
        Path::new(&out_dir).join("README_GENERATED.md"),
        rewrite_source_links(&content),
    )
    .unwrap();
}

/// `](src/a/b.rs)` and `](src/a/mod.rs)` → `](crate::a::b)` / `](crate::a)`.
fn rewrite_source_links(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("](src/") {
        let (before, tail) = rest.split_at(start);
        out.push_str(before);
        let target_start = "](src/".len();
        let Some(end) = tail[target_start..].find(')') else {
            out.push_str(tail);
            return out;
        };
        let target = &tail[target_start..target_start + end];
        let module = target
            .strip_suffix("/mod.rs")
            .or_else(|| target.strip_suffix(".rs"))
            .unwrap_or(target)
            .replace('/', "::");
        out.push_str("](crate::");
        out.push_str(&module);
        out.push(')');
        rest = &tail[target_start + end + 1..];
    }
    out.push_str(rest);
    out
}
