//! A read-only facade over a git repository: location, merged configuration, reference
//! resolution, `.gitignore` classification, and submodule enumeration, composed from the
//! smaller single-purpose crates in this workspace. Nothing here writes to disk or shells out
//! to a `git` executable.
#![deny(rust_2018_idioms)]

pub mod error;
pub mod submodule;

use std::path::Path;

use once_cell::unsync::OnceCell;

pub use error::Error;
pub use gitmeta_config::Environment;
pub use gitmeta_discover::Location as RepositoryLocation;
pub use submodule::Submodule;

use gitmeta_hash::{ObjectId, ObjectNameFormat};
use gitmeta_ref::ReferenceStorageFormat;

/// Locate the repository enclosing `path`, the way `git rev-parse --git-dir` does.
///
/// Folds every failure - an unreadable `.git` file, a filesystem error, walking off the root -
/// into `None`; from a caller's point of view there is no usable repository here either way.
pub fn locate(path: &Path) -> Option<RepositoryLocation> {
    gitmeta_discover::locate(path).ok()
}

/// A located, opened repository: its merged configuration chain, a reference resolver, and
/// lazily-computed submodules and ignore matcher.
///
/// Every lazy field here is a compute-once slot: the first caller to ask pays for the work,
/// every later caller on the same `Repository` gets the cached result. None of this is safe to
/// share across threads - build one `Repository` per thread if you need parallelism.
pub struct Repository {
    location: RepositoryLocation,
    config: gitmeta_config::File,
    hash_format: ObjectNameFormat,
    storage_format: ReferenceStorageFormat,
    ref_resolver: OnceCell<gitmeta_ref::RefResolver>,
    ignore_matcher: OnceCell<Option<gitmeta_ignore::Matcher>>,
    head_commit: OnceCell<Option<ObjectId>>,
    submodules: OnceCell<Vec<Submodule>>,
}

impl Repository {
    /// Open the repository at `location`: load its full configuration chain, validate its
    /// `core.repositoryformatversion` / `extensions.*` gate, and apply any `core.worktree`
    /// override. `env` supplies the process environment the config loader needs (`HOME`,
    /// `XDG_CONFIG_HOME`, ...) - capture it once with [`Environment::capture`].
    pub fn open(mut location: RepositoryLocation, env: Environment) -> Result<Self, Error> {
        let span = gitmeta_trace::coarse!("gitmeta::open", git_dir = %location.git_dir.display());
        span.in_scope(|| Repository::open_inner(&mut location, env))
    }

    fn open_inner(location: &mut RepositoryLocation, env: Environment) -> Result<Self, Error> {
        let config = gitmeta_config::load(&location.common_dir, &location.git_dir, &env)?;
        gitmeta_discover::format_gate::check(&config, &location.common_dir)?;

        if let Some(worktree) = config.get(&gitmeta_config::VariableKey::new("core", "worktree")) {
            gitmeta_discover::apply_worktree_override(location, worktree.as_ref())?;
        }

        let hash_format = hash_format_of(&config)?;
        let storage_format = storage_format_of(&config)?;

        Ok(Repository {
            location: location.clone(),
            config,
            hash_format,
            storage_format,
            ref_resolver: OnceCell::new(),
            ignore_matcher: OnceCell::new(),
            head_commit: OnceCell::new(),
            submodules: OnceCell::new(),
        })
    }

    /// Where this repository's git directory, common directory, and (if any) working directory
    /// live.
    pub fn location(&self) -> &RepositoryLocation {
        &self.location
    }

    /// The merged configuration chain this repository was opened with.
    pub fn config(&self) -> &gitmeta_config::File {
        &self.config
    }

    /// The reference resolver backing this repository, for resolving arbitrary ref strings with
    /// [`resolve_reference`] - `head_commit` only ever resolves `HEAD` itself.
    pub fn ref_resolver(&self) -> Result<&gitmeta_ref::RefResolver, Error> {
        if let Some(resolver) = self.ref_resolver.get() {
            return Ok(resolver);
        }
        let resolver = gitmeta_ref::RefResolver::for_repository(
            &self.location.common_dir,
            &self.location.git_dir,
            self.storage_format,
            self.hash_format,
        )?;
        Ok(self.ref_resolver.get_or_init(|| resolver))
    }

    /// The object `HEAD` currently points at, or `None` for an unborn branch.
    pub fn head_commit(&self) -> Result<Option<ObjectId>, Error> {
        if let Some(cached) = self.head_commit.get() {
            return Ok(cached.clone());
        }
        let head = self.ref_resolver()?.head()?;
        Ok(self.head_commit.get_or_init(|| head).clone())
    }

    /// Every submodule listed in `.gitmodules`, checkout location and (if checked out and
    /// itself a locatable repository) current `HEAD` commit resolved. Empty for a bare
    /// repository or one with no `.gitmodules`.
    pub fn submodules(&self) -> Result<&[Submodule], Error> {
        if let Some(cached) = self.submodules.get() {
            return Ok(cached);
        }
        let found = match &self.location.working_dir {
            Some(working_dir) => submodule::enumerate(working_dir)?,
            None => Vec::new(),
        };
        Ok(self.submodules.get_or_init(|| found))
    }

    /// A matcher for classifying paths under the working tree as ignored or not, per the
    /// `.gitignore` tree plus `core.excludesFile` / `<common_dir>/info/exclude`. `None` for a
    /// bare repository, which has no working tree to classify.
    pub fn ignore_matcher(&self) -> Option<&gitmeta_ignore::Matcher> {
        if let Some(cached) = self.ignore_matcher.get() {
            return cached.as_ref();
        }
        let built = self.location.working_dir.as_ref().map(|working_dir| {
            let ignore_case = self
                .config
                .get(&gitmeta_config::VariableKey::new("core", "ignorecase"))
                .and_then(|v| {
                    let bytes: &[u8] = &*v;
                    gitmeta_config::values::Boolean::try_from(bytes).ok()
                })
                .map(|b| b.to_bool())
                .unwrap_or(false);
            let excludes_file = self
                .config
                .get(&gitmeta_config::VariableKey::new("core", "excludesfile"))
                .map(|v| gitmeta_path::from_bstr(v).into_owned());
            let info_exclude = self.location.common_dir.join("info").join("exclude");
            let info_exclude = if info_exclude.is_file() { Some(info_exclude) } else { None };
            gitmeta_ignore::Matcher::new(working_dir.clone(), ignore_case, excludes_file.as_deref(), info_exclude.as_deref())
        });
        self.ignore_matcher.get_or_init(|| built).as_ref()
    }
}

pub(crate) fn hash_format_of(config: &gitmeta_config::File) -> Result<ObjectNameFormat, Error> {
    let value = config.get(&gitmeta_config::VariableKey::new("extensions", "objectformat"));
    let bytes: Option<&[u8]> = value.map(|v| &*v);
    Ok(match bytes {
        None => ObjectNameFormat::Sha1,
        Some(v) if v == b"sha1" => ObjectNameFormat::Sha1,
        Some(v) if v == b"sha256" => ObjectNameFormat::Sha256,
        Some(v) => {
            return Err(gitmeta_ref::Error::NotSupported(format!(
                "unsupported extensions.objectformat value {:?}",
                String::from_utf8_lossy(v)
            ))
            .into())
        }
    })
}

pub(crate) fn storage_format_of(config: &gitmeta_config::File) -> Result<ReferenceStorageFormat, Error> {
    let value = config.get(&gitmeta_config::VariableKey::new("extensions", "refstorage"));
    let bytes: Option<&[u8]> = value.map(|v| &*v);
    Ok(ReferenceStorageFormat::from_extension_value(bytes)?)
}

/// Resolve a reference string - a full hex object name, or `"ref: <refs/... name>"` - to the
/// object it names, using `resolver` for the symbolic case.
pub fn resolve_reference(resolver: &gitmeta_ref::RefResolver, ref_string: &[u8]) -> Result<Option<ObjectId>, Error> {
    if let Some(name) = ref_string.strip_prefix(b"ref: ") {
        return Ok(resolver.resolve(name)?);
    }
    let text = std::str::from_utf8(ref_string).map_err(|_| Error::InvalidReferenceString(ref_string.to_vec()))?;
    match ObjectId::from_hex(text) {
        Ok(id) => Ok(Some(id)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_loose_repo(dir: &Path) {
        std::fs::create_dir_all(dir.join(".git").join("refs").join("heads")).unwrap();
        std::fs::write(dir.join(".git").join("HEAD"), "ref: refs/heads/main\n").unwrap();
        std::fs::write(dir.join(".git").join("refs").join("heads").join("main"), format!("{}\n", "d".repeat(40))).unwrap();
    }

    #[test]
    fn opens_a_repository_and_resolves_its_head_commit() {
        let tmp = tempfile::tempdir().unwrap();
        init_loose_repo(tmp.path());

        let location = locate(tmp.path()).unwrap();
        let repository = Repository::open(location, Environment::default()).unwrap();
        let head = repository.head_commit().unwrap().unwrap();
        assert_eq!(head.to_hex(), "d".repeat(40));
    }

    #[test]
    fn a_bare_repository_has_no_ignore_matcher_and_no_submodules() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("refs").join("heads")).unwrap();
        std::fs::write(tmp.path().join("HEAD"), "ref: refs/heads/main\n").unwrap();

        let location = locate(tmp.path()).unwrap();
        assert!(location.working_dir.is_none());
        let repository = Repository::open(location, Environment::default()).unwrap();
        assert!(repository.ignore_matcher().is_none());
        assert!(repository.submodules().unwrap().is_empty());
    }

    #[test]
    fn an_unsupported_repository_format_version_fails_to_open() {
        let tmp = tempfile::tempdir().unwrap();
        init_loose_repo(tmp.path());
        std::fs::write(tmp.path().join(".git").join("config"), "[core]\n\trepositoryformatversion = 2\n").unwrap();

        let location = locate(tmp.path()).unwrap();
        assert!(matches!(Repository::open(location, Environment::default()), Err(Error::Discover(_))));
    }

    #[test]
    fn resolve_reference_parses_a_bare_hex_object_name() {
        let tmp = tempfile::tempdir().unwrap();
        init_loose_repo(tmp.path());
        let location = locate(tmp.path()).unwrap();
        let repository = Repository::open(location, Environment::default()).unwrap();
        let resolver = repository.ref_resolver().unwrap();

        let hex = "e".repeat(40);
        let resolved = resolve_reference(resolver, hex.as_bytes()).unwrap().unwrap();
        assert_eq!(resolved.to_hex(), hex);
    }
}
