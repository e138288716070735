/// Prefix docker desktop puts in front of host paths it reports.
const HOST_MNT_PREFIX: &str = "/host_mnt";

/// One volume: a host directory and where it appears in the container.
/// Both sides are stored in normalized, '/'-separated form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    host: String,
    container: String,
}

impl Mount {
    pub fn new(host: &str, container: &str) -> Self {
        Self {
            host: normalize_host_path(host),
            container: trim_trailing_sep(container.replace('\\', "/")),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn container(&self) -> &str {
        &self.container
    }
}

/// Ordered host -> container prefix table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountMap {
    mounts: Vec<Mount>,
}

impl MountMap {
    pub fn new(mounts: Vec<Mount>) -> Self {
        Self { mounts }
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// True if some mount puts a volume at exactly `container_root`.
    pub fn has_container_root(&self, container_root: &str) -> bool {
        let root = trim_trailing_sep(container_root.to_owned());
        self.mounts.iter().any(|m| m.container == root)
    }

    /// True if `container_path` is inside some mounted volume.
    pub fn covers_container(&self, container_path: &str) -> bool {
        let path = trim_trailing_sep(container_path.to_owned());
        longest_prefix(&self.mounts, &path, |m| &m.container).is_some()
    }

    /// Rewrite a host path through the most specific mount containing it.
    /// Paths under no mount come back unchanged.
    pub fn to_container(&self, host_path: &str) -> String {
        let path = normalize_host_path(host_path);
        match longest_prefix(&self.mounts, &path, |m| &m.host) {
            Some(m) => replace_prefix(&path, &m.host, &m.container),
            None => host_path.to_owned(),
        }
    }

    /// Rewrite a container path back to (normalized) host form.
    /// Paths under no mount come back unchanged.
    pub fn to_host(&self, container_path: &str) -> String {
        match longest_prefix(&self.mounts, container_path, |m| &m.container) {
            Some(m) => replace_prefix(container_path, &m.container, &m.host),
            None => container_path.to_owned(),
        }
    }
}

/// Canonical form for a host-side path:
/// `C:\Users\me` becomes `/c/Users/me`, a leading `/host_mnt` is stripped,
/// and trailing separators are dropped.
pub fn normalize_host_path(path: &str) -> String {
    let bytes = path.as_bytes();
    let path = if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let drive = (bytes[0] as char).to_ascii_lowercase();
        let rest = path[2..].replace('\\', "/");
        format!("/{drive}/{}", rest.trim_start_matches('/'))
    } else {
        path.to_owned()
    };

    let path = match path.strip_prefix(HOST_MNT_PREFIX) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.to_owned(),
        _ => path,
    };
    let path = if path.is_empty() { "/".to_owned() } else { path };
    trim_trailing_sep(path)
}

fn trim_trailing_sep(mut path: String) -> String {
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}

/// `path` is under `root` if it is `root`, or continues past it with a separator.
fn is_under(path: &str, root: &str) -> bool {
    if root == "/" {
        return path.starts_with('/');
    }
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn longest_prefix<'a, F>(mounts: &'a [Mount], path: &str, side: F) -> Option<&'a Mount>
where
    F: Fn(&Mount) -> &String,
{
    mounts
        .iter()
        .filter(|m| is_under(path, side(*m)))
        .max_by_key(|m| side(*m).len())
}

fn replace_prefix(path: &str, from: &str, to: &str) -> String {
    let rest = if from == "/" { path } else { &path[from.len()..] };
    let joined = format!("{}{}", to.trim_end_matches('/'), rest);
    if joined.is_empty() {
        "/".to_owned()
    } else {
        joined
    }
}
