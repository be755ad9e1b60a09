use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use strata_core::config::CacheConfig;
use strata_core::error::{Error, ModuleFailure};
use strata_core::modules::{
    artifact_cache_path, collect_external_references, ModuleReference, ModuleResolver, OciArtifact,
    RegistryClient, RegistryError,
};
use strata_core::syntax::{parse_source, DeclId, SourceFile};
use strata_core::vfs::{FileResolver, FsResult, InMemoryFileSystem, VirtualPath};
use strata_core::workspace::Workspace;
use strata_core::{GroupingBuilder, SyntaxTreeGrouping};

/// File access stub that counts reads per location.
struct CountingFs {
    inner: InMemoryFileSystem,
    reads: Mutex<HashMap<VirtualPath, usize>>,
}

impl CountingFs {
    fn new(inner: InMemoryFileSystem) -> Self {
        Self {
            inner,
            reads: Mutex::new(HashMap::new()),
        }
    }

    fn reads_of(&self, location: &VirtualPath) -> usize {
        self.reads
            .lock()
            .expect("read counter lock")
            .get(location)
            .copied()
            .unwrap_or(0)
    }
}

impl FileResolver for CountingFs {
    fn try_read(&self, location: &VirtualPath) -> FsResult<String> {
        *self
            .reads
            .lock()
            .expect("read counter lock")
            .entry(location.clone())
            .or_insert(0) += 1;
        self.inner.try_read(location)
    }

    fn exists(&self, location: &VirtualPath) -> bool {
        self.inner.exists(location)
    }
}

struct NullRegistry;

impl RegistryClient for NullRegistry {
    fn pull(&self, _artifact: &OciArtifact) -> Result<(), RegistryError> {
        Ok(())
    }

    fn local_cache_path(&self, artifact: &OciArtifact) -> VirtualPath {
        artifact_cache_path(&VirtualPath::from("/cache"), artifact)
    }
}

fn fixture(files: &[(&str, &str)]) -> Arc<CountingFs> {
    let mem = InMemoryFileSystem::new();
    for (location, text) in files {
        mem.write(VirtualPath::from(*location), *text);
    }
    Arc::new(CountingFs::new(mem))
}

fn build(
    fs: &Arc<CountingFs>,
    workspace: &Workspace,
    entry: &str,
) -> Result<SyntaxTreeGrouping, Error> {
    let resolver = ModuleResolver::new(
        fs.clone(),
        Arc::new(NullRegistry),
        CacheConfig::new(VirtualPath::from("/cache")),
    );
    GroupingBuilder::build(fs.as_ref(), &resolver, workspace, &VirtualPath::from(entry))
}

/// The id of the declaration named `name` inside `file`.
fn decl(file: &SourceFile, name: &str) -> DeclId {
    file.module_decls()
        .find(|(_, decl)| decl.name == name)
        .map(|(id, _)| id)
        .expect("declaration exists")
}

#[test]
fn shared_target_is_loaded_once_and_shared() {
    let fs = fixture(&[
        (
            "/main.strata",
            "module a './a.strata'\nmodule b './b.strata'\n",
        ),
        ("/a.strata", "module shared './c.strata'\n"),
        ("/b.strata", "module shared './c.strata'\n"),
        ("/c.strata", "var leaf = true\n"),
    ]);
    let grouping = build(&fs, &Workspace::new(), "/main.strata").expect("build succeeds");

    assert_eq!(fs.reads_of(&VirtualPath::from("/c.strata")), 1);

    let a = grouping.file_at(&VirtualPath::from("/a.strata")).unwrap();
    let b = grouping.file_at(&VirtualPath::from("/b.strata")).unwrap();
    let from_a = grouping.resolved(&decl(a, "shared")).expect("resolved");
    let from_b = grouping.resolved(&decl(b, "shared")).expect("resolved");
    assert!(Arc::ptr_eq(from_a, from_b));
}

#[test]
fn mutual_references_are_reported_as_a_cycle() {
    let fs = fixture(&[
        ("/a.strata", "module other './b.strata'\n"),
        ("/b.strata", "module other './a.strata'\n"),
    ]);
    let grouping = build(&fs, &Workspace::new(), "/a.strata").expect("build succeeds");

    let a = grouping.entry().clone();
    let b = grouping.file_at(&VirtualPath::from("/b.strata")).unwrap().clone();

    for (file, first) in [(&a, "/b.strata"), (&b, "/a.strata")] {
        let id = decl(file, "other");
        assert!(grouping.resolved(&id).is_none(), "success must be superseded");
        match grouping.failure(&id) {
            Some(ModuleFailure::CyclicModule { chain }) => {
                assert_eq!(chain.len(), 2);
                assert_eq!(chain[0], first.to_string());
            }
            other => panic!("expected cycle failure, got {:?}", other),
        }
    }
}

#[test]
fn self_reference_is_distinguished_from_longer_cycles() {
    let fs = fixture(&[("/main.strata", "module me './main.strata'\n")]);
    let grouping = build(&fs, &Workspace::new(), "/main.strata").expect("build succeeds");

    let id = decl(grouping.entry(), "me");
    assert_eq!(
        grouping.failure(&id),
        Some(&ModuleFailure::CyclicSelfReference)
    );
    assert!(grouping.resolved(&id).is_none());
}

#[test]
fn missing_entry_file_is_fatal() {
    let fs = fixture(&[]);
    let err = build(&fs, &Workspace::new(), "/main.strata").expect_err("entry is unreadable");
    match err {
        Error::EntryLoad { location, failure } => {
            assert_eq!(location, VirtualPath::from("/main.strata"));
            assert!(matches!(failure, ModuleFailure::FileReadFailure { .. }));
        }
        other => panic!("expected fatal entry failure, got {:?}", other),
    }
}

#[test]
fn failures_do_not_stop_sibling_declarations() {
    let fs = fixture(&[
        (
            "/main.strata",
            "module bad './missing.strata'\nmodule ugly 'nuget:My.Package@1.0'\nmodule good './good.strata'\n",
        ),
        ("/good.strata", "var ok = true\n"),
    ]);
    let grouping = build(&fs, &Workspace::new(), "/main.strata").expect("build succeeds");
    let entry = grouping.entry().clone();

    assert!(matches!(
        grouping.failure(&decl(&entry, "bad")),
        Some(ModuleFailure::FileReadFailure { .. })
    ));
    assert!(matches!(
        grouping.failure(&decl(&entry, "ugly")),
        Some(ModuleFailure::UnsupportedReferenceKind { scheme: "nuget" })
    ));
    assert!(grouping.resolved(&decl(&entry, "good")).is_some());
    assert!(grouping
        .file_at(&VirtualPath::from("/good.strata"))
        .is_some());
}

#[test]
fn unreadable_target_is_read_only_once() {
    let fs = fixture(&[(
        "/main.strata",
        "module first './missing.strata'\nmodule second './missing.strata'\n",
    )]);
    let grouping = build(&fs, &Workspace::new(), "/main.strata").expect("build succeeds");
    let entry = grouping.entry().clone();

    for name in ["first", "second"] {
        assert!(matches!(
            grouping.failure(&decl(&entry, name)),
            Some(ModuleFailure::FileReadFailure { .. })
        ));
    }
    assert_eq!(fs.reads_of(&VirtualPath::from("/missing.strata")), 1);
}

#[test]
fn invalid_reference_strings_attach_grammar_failures() {
    let fs = fixture(&[(
        "/main.strata",
        "module empty\nmodule abs '/abs.strata'\nmodule odd 'ftp:x'\n",
    )]);
    let grouping = build(&fs, &Workspace::new(), "/main.strata").expect("build succeeds");
    let entry = grouping.entry().clone();

    assert_eq!(
        grouping.failure(&decl(&entry, "empty")),
        Some(&ModuleFailure::PathNotSpecified)
    );
    assert_eq!(
        grouping.failure(&decl(&entry, "abs")),
        Some(&ModuleFailure::PathBeginsWithSlash)
    );
    assert!(matches!(
        grouping.failure(&decl(&entry, "odd")),
        Some(ModuleFailure::UnknownScheme { .. })
    ));
}

#[test]
fn open_documents_take_precedence_over_disk() {
    let fs = fixture(&[
        ("/main.strata", "module stale './stale.strata'\n"),
        ("/stale.strata", "var stale = true\n"),
    ]);
    let mut workspace = Workspace::new();
    workspace.upsert_sources([Arc::new(parse_source(
        VirtualPath::from("/main.strata"),
        "module fresh './fresh.strata'\n",
    ))]);
    fs.inner
        .write(VirtualPath::from("/fresh.strata"), "var fresh = true\n");

    let grouping = build(&fs, &workspace, "/main.strata").expect("build succeeds");
    let entry = grouping.entry().clone();

    assert!(grouping.resolved(&decl(&entry, "fresh")).is_some());
    assert_eq!(fs.reads_of(&VirtualPath::from("/main.strata")), 0);
    assert!(grouping
        .file_at(&VirtualPath::from("/stale.strata"))
        .is_none());
}

#[test]
fn external_references_are_collected_exactly_once() {
    let fs = fixture(&[
        (
            "/main.strata",
            "module net 'oci:example.com/infra/net:v1'\nmodule child './child.strata'\nmodule feed 'nuget:My.Package@1.0'\n",
        ),
        (
            "/child.strata",
            "module net 'oci:example.com/infra/net:v1'\nmodule local './leaf.strata'\n",
        ),
        ("/leaf.strata", "var leaf = true\n"),
    ]);
    let grouping = build(&fs, &Workspace::new(), "/main.strata").expect("build succeeds");

    let references = collect_external_references(&grouping);
    assert_eq!(references.len(), 2);
    assert!(references.contains(&ModuleReference::OciArtifact(OciArtifact {
        registry: "example.com".to_string(),
        repository: "/infra/net".to_string(),
        tag: "v1".to_string(),
    })));
    assert!(references.contains(&ModuleReference::NuGet {
        package_id: "My.Package".to_string(),
        version: "1.0".to_string(),
    }));
    assert!(references.iter().all(|reference| !reference.is_local()));
}

#[test]
fn every_reachable_declaration_lands_in_exactly_one_map() {
    let fs = fixture(&[
        (
            "/main.strata",
            "module good './a.strata'\nmodule bad './missing.strata'\nmodule looped './b.strata'\n",
        ),
        ("/a.strata", "var ok = true\n"),
        ("/b.strata", "module back './main.strata'\n"),
    ]);
    let grouping = build(&fs, &Workspace::new(), "/main.strata").expect("build succeeds");

    for file in grouping.files().cloned().collect::<Vec<_>>() {
        for (id, _) in file.module_decls() {
            let resolved = grouping.resolved(&id).is_some();
            let failed = grouping.failure(&id).is_some();
            assert!(
                resolved ^ failed,
                "declaration {} must be in exactly one map",
                id
            );
        }
    }
}
