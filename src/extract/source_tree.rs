//! Capability-scoped view of the files under one paper directory.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use tracing::debug;

/// Files under a paper directory, walked once and kept in a stable order.
///
/// Paths are relative to the root and ordered lexicographically, depth
/// first. Symbolic links are neither followed nor listed, and every read
/// goes through the directory capability, so nothing outside the root is
/// reachable.
#[derive(Debug)]
pub struct SourceTree {
    root: Utf8PathBuf,
    dir: Dir,
    files: Vec<Utf8PathBuf>,
}

impl SourceTree {
    /// Opens `root` and records every regular file beneath it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `root` cannot be opened or a subdirectory
    /// cannot be listed.
    pub fn open(root: &Utf8Path) -> io::Result<Self> {
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        let mut files = Vec::new();
        collect_files(&dir, Utf8Path::new(""), &mut files)?;
        Ok(Self {
            root: root.to_path_buf(),
            dir,
            files,
        })
    }

    /// Returns the directory this tree was opened on.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns every file, relative to the root.
    #[must_use]
    pub fn files(&self) -> &[Utf8PathBuf] {
        &self.files
    }

    /// Iterates the files whose extension is one of `extensions`.
    ///
    /// Matching is case sensitive.
    pub fn files_with_extensions<'a>(
        &'a self,
        extensions: &'a [&'a str],
    ) -> impl Iterator<Item = &'a Utf8Path> + 'a {
        self.files
            .iter()
            .map(Utf8PathBuf::as_path)
            .filter(|path| path.extension().is_some_and(|ext| extensions.contains(&ext)))
    }

    /// Reads a file as text, replacing invalid UTF-8 sequences.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub fn read_lossy(&self, relative: &Utf8Path) -> io::Result<String> {
        let bytes = self.dir.read(relative)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Joins a relative path onto the root.
    #[must_use]
    pub fn absolute(&self, relative: &Utf8Path) -> Utf8PathBuf {
        self.root.join(relative)
    }
}

fn collect_files(dir: &Dir, prefix: &Utf8Path, out: &mut Vec<Utf8PathBuf>) -> io::Result<()> {
    let mut names = Vec::new();
    for item in dir.entries()? {
        match item?.file_name() {
            Ok(name) => names.push(name),
            Err(error) => debug!(%prefix, %error, "skipping entry with a non UTF-8 name"),
        }
    }
    names.sort();

    for name in names {
        // `symlink_metadata` reports the link itself, so links are skipped.
        let file_type = dir.symlink_metadata(&name)?.file_type();
        let path = prefix.join(&name);
        if file_type.is_dir() {
            let child = dir.open_dir(&name)?;
            collect_files(&child, &path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_helpers::PaperDir;

    use super::*;

    fn open(paper: &PaperDir) -> SourceTree {
        let root = Utf8Path::from_path(paper.path()).expect("utf-8 temp path");
        SourceTree::open(root).expect("open source tree")
    }

    #[test]
    fn walks_files_in_lexicographic_depth_first_order() {
        let paper = PaperDir::new()
            .with_file("b.tex", "b")
            .with_file("a/z.sty", "z")
            .with_file("a/b/c.tex", "c")
            .with_file("c.bib", "bib");
        let tree = open(&paper);
        let files: Vec<&str> = tree.files().iter().map(|p| p.as_str()).collect();
        assert_eq!(files, ["a/b/c.tex", "a/z.sty", "b.tex", "c.bib"]);
    }

    #[test]
    fn filters_by_case_sensitive_extension() {
        let paper = PaperDir::new()
            .with_file("main.tex", "")
            .with_file("notes.TEX", "")
            .with_file("macros.sty", "");
        let tree = open(&paper);
        let tex: Vec<&str> = tree
            .files_with_extensions(&["tex"])
            .map(Utf8Path::as_str)
            .collect();
        assert_eq!(tex, ["main.tex"]);
    }

    #[test]
    fn reads_invalid_utf8_lossily() {
        let paper = PaperDir::new();
        paper.write_bytes("main.tex", b"caf\xe9 \\begin{document}");
        let tree = open(&paper);
        let text = tree.read_lossy(Utf8Path::new("main.tex")).expect("read");
        assert!(text.ends_with("\\begin{document}"));
        assert!(text.contains('\u{fffd}'));
    }

    #[cfg(unix)]
    #[test]
    fn symbolic_links_are_not_listed() {
        let paper = PaperDir::new().with_file("real/main.tex", "x");
        std::os::unix::fs::symlink(paper.file("real"), paper.file("link"))
            .expect("create symlink");
        let tree = open(&paper);
        let files: Vec<&str> = tree.files().iter().map(|p| p.as_str()).collect();
        assert_eq!(files, ["real/main.tex"]);
    }
}
