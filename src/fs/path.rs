//! Path normalization shared by every filesystem operation.
//!
//! All cached paths are absolute, slash-separated and carry no trailing
//! slash; the root is `/`.

/// Normalize a path (collapse `//` and `.`, strip trailing slashes, force a leading `/`).
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    format!("/{}", segments.join("/"))
}

/// Parent of a normalized path; `None` for the root.
pub fn parent_path(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last segment of a normalized path (empty for the root).
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

/// Join a normalized directory path and a child name.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Whether `path` is `ancestor` itself or lies below it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return true;
    }
    path == ancestor
        || (path.starts_with(ancestor) && path.as_bytes().get(ancestor.len()) == Some(&b'/'))
}

/// Ancestors of `path` from the root down, excluding `path` itself.
pub fn ancestors(path: &str) -> Vec<&str> {
    let mut chain = Vec::new();
    let mut current = parent_path(path);
    while let Some(p) = current {
        chain.push(p);
        current = parent_path(p);
    }
    chain.reverse();
    chain
}
