//! The repository set: every policy file of one policy root, held in
//! memory with per-file dirty tracking.

use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::{debug, info, trace, warn};

use super::config::RepoConfig;
use super::file_loader;
use crate::error::{PolicyError, Result};
use crate::parser::parse_file;
use crate::syntax::ast::{Definition, Forest, Variant};
use crate::syntax::formatter::render;
use crate::syntax::order;

/// One loaded (or newly created) policy file.
#[derive(Debug, Clone)]
pub struct PolicyFile {
    /// Path relative to the policy root.
    pub path: PathBuf,
    /// Bytes the forest was parsed from; empty for new files.
    pub source: String,
    pub forest: Forest,
    dirty: bool,
}

impl PolicyFile {
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn render(&self) -> String {
        render(&self.forest, &self.source)
    }
}

#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    files: IndexMap<PathBuf, PolicyFile>,
    /// Definition name to the file holding it.
    index: FxHashMap<SmolStr, PathBuf>,
}

impl Repository {
    /// Load and parse every policy file below `root`.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = RepoConfig::load(&root)?;
        let mut repo = Self::empty(root);
        for relative in file_loader::collect_file_paths(&repo.root, &config)? {
            let source = file_loader::load_file(&repo.root.join(&relative))?;
            repo.add_file(relative, source)?;
        }
        info!(
            root = %repo.root.display(),
            files = repo.files.len(),
            definitions = repo.index.len(),
            "loaded policy"
        );
        Ok(repo)
    }

    /// Build a repository from in-memory sources, for callers that do
    /// their own file handling.
    pub fn from_sources<I, P, S>(root: impl Into<PathBuf>, files: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let mut repo = Self::empty(root.into());
        for (path, source) in files {
            repo.add_file(path.into(), source.into())?;
        }
        Ok(repo)
    }

    fn empty(root: PathBuf) -> Self {
        Self {
            root,
            files: IndexMap::new(),
            index: FxHashMap::default(),
        }
    }

    fn add_file(&mut self, path: PathBuf, source: String) -> Result<()> {
        let forest = parse_file(&source, &path.display().to_string())?;
        debug!(
            file = %path.display(),
            definitions = forest.definitions.len(),
            "parsed file"
        );
        for def in &forest.definitions {
            let name = SmolStr::new(def.name());
            if let Some(first) = self.index.get(&name) {
                warn!(
                    name = %name,
                    file = %path.display(),
                    first = %first.display(),
                    "duplicate definition, keeping the first"
                );
                continue;
            }
            self.index.insert(name, path.clone());
        }
        self.files.insert(
            path.clone(),
            PolicyFile {
                path,
                source,
                forest,
                dirty: false,
            },
        );
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> impl Iterator<Item = &PolicyFile> {
        self.files.values()
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<&PolicyFile> {
        self.files.get(path.as_ref())
    }

    /// All definitions in load order.
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.files.values().flat_map(|f| f.forest.definitions.iter())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// File holding the definition `name`.
    pub fn location(&self, name: &str) -> Option<&Path> {
        self.index.get(name).map(PathBuf::as_path)
    }

    pub fn lookup(&self, name: &str) -> Result<&Definition> {
        self.index
            .get(name)
            .and_then(|path| self.files.get(path))
            .and_then(|file| file.forest.find(name))
            .ok_or_else(|| PolicyError::not_found(name))
    }

    /// Typed lookup; a definition of another variant is an error.
    pub fn lookup_as<D: Variant>(&self, name: &str) -> Result<&D> {
        let def = self.lookup(name)?;
        D::cast(def).ok_or_else(|| type_mismatch::<D>(name, def))
    }

    /// Apply `edit` to every definition matching `predicate`; returns
    /// the number of files touched.
    pub fn modify_matching<P, E>(&mut self, mut predicate: P, mut edit: E) -> Result<usize>
    where
        P: FnMut(&Definition) -> bool,
        E: FnMut(&mut Definition) -> Result<()>,
    {
        let mut touched = 0;
        for file in self.files.values_mut() {
            let mut hit = false;
            for def in file.forest.definitions.iter_mut() {
                if predicate(&*def) {
                    trace!(name = def.name(), file = %file.path.display(), "modify");
                    edit(def)?;
                    hit = true;
                }
            }
            if hit {
                file.dirty = true;
                touched += 1;
            }
        }
        Ok(touched)
    }

    /// Edit the definition `name`, which must be a `D`.
    pub fn modify_by_name<D, F, T>(&mut self, name: &str, edit: F) -> Result<T>
    where
        D: Variant,
        F: FnOnce(&mut D) -> Result<T>,
    {
        let file = self.file_of_mut(name)?;
        let def = file
            .forest
            .definitions
            .iter_mut()
            .find(|d| d.name() == name)
            .ok_or_else(|| PolicyError::not_found(name))?;
        let found = def.kind_name();
        let typed = D::cast_mut(def).ok_or_else(|| PolicyError::TypeMismatch {
            name: name.to_string(),
            expected: D::KIND,
            found,
        })?;
        trace!(name, file = %file.path.display(), "modify");
        let result = edit(typed)?;
        file.dirty = true;
        Ok(result)
    }

    fn file_of_mut(&mut self, name: &str) -> Result<&mut PolicyFile> {
        self.index
            .get(name)
            .and_then(|path| self.files.get_mut(path))
            .ok_or_else(|| PolicyError::not_found(name))
    }

    /// Insert a new definition into `file` at its sorted position.
    pub fn create(&mut self, file: impl AsRef<Path>, def: Definition) -> Result<()> {
        let path = check_relative(file.as_ref())?;
        let name = SmolStr::new(def.name());
        if self.contains(&name) {
            return Err(PolicyError::AlreadyExists(name.to_string()));
        }
        let entry = self.files.entry(path.clone()).or_insert_with(|| {
            debug!(file = %path.display(), "new file");
            PolicyFile {
                path: path.clone(),
                source: String::new(),
                forest: Forest::default(),
                dirty: false,
            }
        });
        let index = order::insertion_index(&entry.forest.definitions, &def);
        entry.forest.definitions.insert(index, def);
        entry.dirty = true;
        trace!(name = %name, file = %path.display(), index, "create");
        self.index.insert(name, path);
        Ok(())
    }

    /// Remove the definition `name` from the file holding it.
    pub fn delete(&mut self, name: &str) -> Result<Definition> {
        let file = self.file_of_mut(name)?;
        let index = file
            .forest
            .position(name)
            .ok_or_else(|| PolicyError::not_found(name))?;
        let def = file.forest.definitions.remove(index);
        file.dirty = true;
        trace!(name, file = %file.path.display(), "delete");
        self.index.remove(name);
        Ok(def)
    }

    pub fn dirty_paths(&self) -> Vec<&Path> {
        self.files
            .values()
            .filter(|f| f.dirty)
            .map(|f| f.path.as_path())
            .collect()
    }

    /// Rendered text of every dirty file.
    pub fn render_dirty(&self) -> Vec<(&Path, String)> {
        self.files
            .values()
            .filter(|f| f.dirty)
            .map(|f| (f.path.as_path(), f.render()))
            .collect()
    }

    /// Overwrite exactly the dirty files; returns the paths written.
    pub fn write_back(&self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (relative, text) in self.render_dirty() {
            let path = self.root.join(relative);
            file_loader::write_atomic(&path, &text)?;
            info!(file = %path.display(), "wrote file");
            written.push(path);
        }
        Ok(written)
    }
}

fn type_mismatch<D: Variant>(name: &str, def: &Definition) -> PolicyError {
    PolicyError::TypeMismatch {
        name: name.to_string(),
        expected: D::KIND,
        found: def.kind_name(),
    }
}

/// Target files must stay inside the policy root.
fn check_relative(path: &Path) -> Result<PathBuf> {
    let valid = !path.as_os_str().is_empty()
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if !valid {
        return Err(PolicyError::invalid(format!(
            "Invalid file name '{}', must be a relative path inside the policy",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}
