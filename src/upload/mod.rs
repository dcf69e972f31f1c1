//! Upload orchestration
//!
//! Runs one upload from folder scan to finalize:
//!
//! ```text
//! Collecting -> (prepare) -> Staging -> Archiving -> Transferring -> Finalizing -> Done
//! ```
//!
//! Nothing touches the disk before `prepare` succeeds. From Staging on, the
//! [`StagingArea`] owns the build directory and archive and removes both when
//! it goes out of scope, whatever the outcome.

mod staging;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::archive::{create_archive, ArchiveSummary};
use crate::cli::progress::ProgressReporter;
use crate::config::WEB_URL;
use crate::error::{HubError, Result};
use crate::prompt::{Prompter, CANCELLED};
use crate::registry::{
    EntityType, FinalizePayload, PrepareOutcome, Registry, UploadSession, Visibility,
};
use crate::session::UserIdentity;
use crate::skill::{collect, FileRecord, Manifest};

pub use staging::StagingArea;

pub const BUILD_ERROR_CONTEXT: &str = "Error creating build directory";

const CONFIRM_UPLOAD: &str = "Would you like to upload this skill to the AnythingLLM Hub?";
const CHOOSE_VISIBILITY: &str = "Do you want this skill to be visible to all users (public), \
or only you and teams you share it with (private)?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Collecting,
    Staging,
    Archiving,
    Transferring,
    Finalizing,
    Done,
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Collecting => "collecting",
            Self::Staging => "staging",
            Self::Archiving => "archiving",
            Self::Transferring => "transferring",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub folder: PathBuf,
    pub entity: EntityType,
    /// Asked interactively when not given.
    pub visibility: Option<Visibility>,
    /// Skip the upload confirmation.
    pub assume_yes: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub entity_id: String,
    pub name: String,
    pub version: String,
    pub visibility: Visibility,
    pub file_count: usize,
    pub archive_bytes: u64,
    pub url: String,
}

/// Zips a staged directory into the given archive path.
pub type ArchiveFn = fn(&Path, &Path) -> Result<ArchiveSummary>;

pub struct UploadOrchestrator<'a> {
    registry: &'a dyn Registry,
    prompter: &'a mut dyn Prompter,
    progress: &'a ProgressReporter,
    identity: UserIdentity,
    staging_root: PathBuf,
    web_url: String,
    archiver: ArchiveFn,
    phase: UploadPhase,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(
        registry: &'a dyn Registry,
        prompter: &'a mut dyn Prompter,
        progress: &'a ProgressReporter,
    ) -> Self {
        Self {
            registry,
            prompter,
            progress,
            identity: UserIdentity::default(),
            staging_root: std::env::temp_dir(),
            web_url: WEB_URL.to_string(),
            archiver: create_archive,
            phase: UploadPhase::Collecting,
        }
    }

    #[must_use]
    pub fn identity(mut self, identity: UserIdentity) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn staging_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging_root = root.into();
        self
    }

    #[must_use]
    pub fn web_url(mut self, url: impl Into<String>) -> Self {
        self.web_url = url.into();
        self
    }

    /// Swap the zip step. Defaults to [`create_archive`].
    #[must_use]
    pub fn archiver(mut self, archiver: ArchiveFn) -> Self {
        self.archiver = archiver;
        self
    }

    /// Phase reached by the last run.
    #[must_use]
    pub const fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn run(&mut self, request: &UploadRequest) -> Result<UploadReport> {
        self.enter(UploadPhase::Collecting);
        let mut files = collect(
            &request.folder,
            &self.identity,
            &mut *self.prompter,
            self.progress,
        )?;
        let manifest = files
            .iter()
            .find_map(FileRecord::manifest)
            .cloned()
            .ok_or_else(|| HubError::ValidationFailed("Manifest record missing".to_string()))?;

        self.print_summary(&manifest, files.len());
        if !request.assume_yes && !self.prompter.confirm(CONFIRM_UPLOAD)? {
            return Err(HubError::UserAbort(CANCELLED.to_string()));
        }

        self.progress.log("Registering skill with AnythingLLM Hub...");
        let visibility = match request.visibility {
            Some(visibility) => visibility,
            None => self.choose_visibility()?,
        };

        let session = match self.registry.prepare(request.entity, visibility) {
            PrepareOutcome::Ready(session) => session,
            PrepareOutcome::Rejected { error } => return Err(HubError::Registry(error)),
        };
        self.progress
            .step(&format!("Acquired registration ID: {}", session.entity_id));

        for record in &mut files {
            if let Some(manifest) = record.manifest_mut() {
                manifest.assign_hub_id(session.entity_id.as_str());
            }
        }

        let archive_bytes = self
            .ship(request, &session, &manifest, &files)
            .map_err(|err| err.in_phase(BUILD_ERROR_CONTEXT))?;
        self.enter(UploadPhase::Done);

        let url = format!(
            "{}/i/{}/{}",
            self.web_url.trim_end_matches('/'),
            request.entity,
            session.entity_id
        );
        self.progress
            .step(&format!("Agent skill uploaded! You can find your skill at {url}"));

        Ok(UploadReport {
            entity_id: session.entity_id,
            name: manifest.name,
            version: manifest.version,
            visibility,
            file_count: files.len(),
            archive_bytes,
            url,
        })
    }

    /// Stage, archive, transfer and finalize. The staging area is dropped,
    /// and with it the build directory and archive, before this returns.
    fn ship(
        &mut self,
        request: &UploadRequest,
        session: &UploadSession,
        manifest: &Manifest,
        files: &[FileRecord],
    ) -> Result<u64> {
        self.enter(UploadPhase::Staging);
        self.progress.log("Creating build directory");
        let staging = StagingArea::create(&self.staging_root, &session.entity_id)?;
        for record in files {
            self.progress.log(&format!(">>> Copying {}...", record.name));
            if record.is_dependency_dir() {
                staging.copy_tree(&request.folder.join(&record.name), &record.name)?;
            } else {
                staging.write_file(&record.name, &record.content.render()?)?;
            }
        }

        self.enter(UploadPhase::Archiving);
        self.progress.log("Creating archive...");
        let archive = (self.archiver)(staging.dir(), staging.archive_path())?;
        info!(entries = archive.entries, bytes = archive.bytes, "Archive created");

        self.enter(UploadPhase::Transferring);
        let spinner = self.progress.spinner("Uploading archive");
        if !self.registry.transfer(session, staging.archive_path()) {
            spinner.abandon_with_message("Upload failed");
            return Err(HubError::Transfer("Failed to upload archive".to_string()));
        }
        spinner.finish_with_message("Archive uploaded");

        self.enter(UploadPhase::Finalizing);
        self.progress.log("Finalizing the upload...");
        let payload = FinalizePayload {
            name: &manifest.name,
            description: &manifest.description,
            files,
        };
        if !self
            .registry
            .finalize(request.entity, &session.entity_id, &payload)
        {
            return Err(HubError::Transfer(
                "Failed to finalize the upload".to_string(),
            ));
        }

        Ok(archive.bytes)
    }

    fn choose_visibility(&mut self) -> Result<Visibility> {
        self.prompter
            .select(CHOOSE_VISIBILITY, Visibility::CHOICES)?
            .as_deref()
            .and_then(Visibility::from_choice)
            .ok_or_else(|| HubError::UserAbort(CANCELLED.to_string()))
    }

    fn print_summary(&self, manifest: &Manifest, file_count: usize) {
        self.progress
            .log(&format!("Found {file_count} valid files in current directory"));
        self.progress.log("--------------------------------");
        self.progress.log(&format!(
            "Agent Skill: {} v{} by @{}",
            manifest.name,
            manifest.version,
            manifest.author_handle()
        ));
        self.progress.log(&format!("Contains {file_count} files."));
        self.progress.log("--------------------------------");
    }

    fn enter(&mut self, phase: UploadPhase) {
        self.phase = phase;
        info!(phase = %phase, "Upload phase");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedPrompter, SkillFixture};
    use std::cell::RefCell;
    use std::path::Path;

    /// What the fake saw on disk when each phase ran.
    #[derive(Debug, Default, Clone)]
    struct Seen {
        prepared: bool,
        staged_manifest: Option<serde_json::Value>,
        archive_existed: bool,
        finalized_files: Vec<String>,
        finalized_manifest: Option<serde_json::Value>,
    }

    struct FakeRegistry {
        prepare: PrepareOutcome,
        transfer_ok: bool,
        finalize_ok: bool,
        seen: RefCell<Seen>,
    }

    impl FakeRegistry {
        fn ok() -> Self {
            Self {
                prepare: PrepareOutcome::Ready(UploadSession {
                    entity_id: "abc123".into(),
                    signed_url: "http://storage.invalid/abc123".into(),
                    upload_uri: "gs://bucket/abc123.zip".into(),
                    visibility: Visibility::Public,
                }),
                transfer_ok: true,
                finalize_ok: true,
                seen: RefCell::default(),
            }
        }

        fn seen(&self) -> Seen {
            self.seen.borrow().clone()
        }
    }

    impl Registry for FakeRegistry {
        fn auth_check(&self, _connection_key: &str) -> bool {
            true
        }

        fn user_info(&self) -> Option<UserIdentity> {
            None
        }

        fn prepare(&self, _entity: EntityType, _visibility: Visibility) -> PrepareOutcome {
            self.seen.borrow_mut().prepared = true;
            self.prepare.clone()
        }

        fn transfer(&self, _session: &UploadSession, archive: &Path) -> bool {
            let staged = archive.with_extension("");
            let manifest = std::fs::read_to_string(staged.join("plugin.json")).unwrap();
            let mut seen = self.seen.borrow_mut();
            seen.staged_manifest = Some(serde_json::from_str(&manifest).unwrap());
            seen.archive_existed = archive.exists() && staged.is_dir();
            self.transfer_ok
        }

        fn finalize(
            &self,
            _entity: EntityType,
            _entity_id: &str,
            payload: &FinalizePayload<'_>,
        ) -> bool {
            let json = serde_json::to_value(payload).unwrap();
            let mut seen = self.seen.borrow_mut();
            seen.finalized_files = payload.files.iter().map(|f| f.name.clone()).collect();
            seen.finalized_manifest = json["files"]
                .as_array()
                .unwrap()
                .iter()
                .find(|f| f["name"] == "plugin.json")
                .map(|f| serde_json::from_str(f["content"].as_str().unwrap()).unwrap());
            self.finalize_ok
        }
    }

    fn request(fixture: &SkillFixture) -> UploadRequest {
        UploadRequest {
            folder: fixture.path().to_path_buf(),
            entity: EntityType::AgentSkill,
            visibility: Some(Visibility::Public),
            assume_yes: false,
        }
    }

    fn identity() -> UserIdentity {
        UserIdentity {
            id: Some("u1".into()),
            username: Some("tim".into()),
            author_url: Some("https://hub.anythingllm.com/u/tim".into()),
        }
    }

    fn run(
        registry: &FakeRegistry,
        fixture: &SkillFixture,
        prompter: &mut ScriptedPrompter,
        root: &Path,
    ) -> (Result<UploadReport>, UploadPhase) {
        let progress = ProgressReporter::silent();
        let mut orchestrator = UploadOrchestrator::new(registry, prompter, &progress)
            .identity(identity())
            .staging_root(root);
        let result = orchestrator.run(&request(fixture));
        (result, orchestrator.phase())
    }

    fn staging_is_empty(root: &Path) -> bool {
        std::fs::read_dir(root).map_or(true, |mut entries| entries.next().is_none())
    }

    #[test]
    fn successful_upload_stamps_manifest_and_cleans_up() {
        let fixture = SkillFixture::new("weather").with_valid_skill();
        let root = fixture.scratch_dir("stage");
        let registry = FakeRegistry::ok();
        let mut prompter = ScriptedPrompter::new().confirm(true);

        let (result, phase) = run(&registry, &fixture, &mut prompter, &root);
        let report = result.unwrap();

        assert_eq!(phase, UploadPhase::Done);
        assert_eq!(report.entity_id, "abc123");
        assert_eq!(report.file_count, 2);
        assert_eq!(report.url, "https://hub.anythingllm.com/i/agent-skill/abc123");

        let seen = registry.seen();
        let staged = seen.staged_manifest.unwrap();
        assert_eq!(staged["hubId"], "abc123");
        assert_eq!(staged["active"], false);
        assert_eq!(staged["author"], "tim");
        assert!(seen.archive_existed);
        assert_eq!(seen.finalized_files, ["handler.js", "plugin.json"]);
        assert_eq!(seen.finalized_manifest.unwrap()["hubId"], "abc123");
        assert!(staging_is_empty(&root));
    }

    #[test]
    fn prepare_rejection_writes_nothing() {
        let fixture = SkillFixture::new("weather").with_valid_skill();
        let root = fixture.scratch_dir("stage");
        let registry = FakeRegistry {
            prepare: PrepareOutcome::Rejected {
                error: "401 - Unauthorized".into(),
            },
            ..FakeRegistry::ok()
        };
        let mut prompter = ScriptedPrompter::new().confirm(true);

        let (result, phase) = run(&registry, &fixture, &mut prompter, &root);
        let err = result.unwrap_err();

        assert!(matches!(err, HubError::Registry(ref msg) if msg == "401 - Unauthorized"));
        assert_eq!(phase, UploadPhase::Collecting);
        assert!(staging_is_empty(&root));
    }

    #[test]
    fn failed_transfer_cleans_up_and_names_phase() {
        let fixture = SkillFixture::new("weather").with_valid_skill();
        let root = fixture.scratch_dir("stage");
        let registry = FakeRegistry {
            transfer_ok: false,
            ..FakeRegistry::ok()
        };
        let mut prompter = ScriptedPrompter::new().confirm(true);

        let (result, phase) = run(&registry, &fixture, &mut prompter, &root);
        let err = result.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error creating build directory: Failed to upload archive"
        );
        assert_eq!(phase, UploadPhase::Transferring);
        assert!(registry.seen().archive_existed);
        assert!(staging_is_empty(&root));
    }

    #[test]
    fn failed_finalize_cleans_up() {
        let fixture = SkillFixture::new("weather").with_valid_skill();
        let root = fixture.scratch_dir("stage");
        let registry = FakeRegistry {
            finalize_ok: false,
            ..FakeRegistry::ok()
        };
        let mut prompter = ScriptedPrompter::new().confirm(true);

        let (result, _) = run(&registry, &fixture, &mut prompter, &root);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Error creating build directory: Failed to finalize the upload"
        );
        assert!(staging_is_empty(&root));
    }

    #[test]
    fn declined_confirmation_never_prepares() {
        let fixture = SkillFixture::new("weather").with_valid_skill();
        let root = fixture.scratch_dir("stage");
        let registry = FakeRegistry::ok();
        let mut prompter = ScriptedPrompter::new().confirm(false);

        let (result, _) = run(&registry, &fixture, &mut prompter, &root);
        assert!(result.unwrap_err().is_user_abort());
        assert!(!registry.seen().prepared);
    }

    #[test]
    fn assume_yes_skips_confirmation() {
        let fixture = SkillFixture::new("weather").with_valid_skill();
        let root = fixture.scratch_dir("stage");
        let registry = FakeRegistry::ok();
        let mut prompter = ScriptedPrompter::new();
        let progress = ProgressReporter::silent();

        UploadOrchestrator::new(&registry, &mut prompter, &progress)
            .staging_root(&root)
            .run(&UploadRequest {
                assume_yes: true,
                ..request(&fixture)
            })
            .unwrap();

        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn invalid_entrypoint_override_never_prepares() {
        let fixture = SkillFixture::new("weather").with_valid_skill().file(
            "plugin.json",
            r#"{"name":"w","description":"d","license":"MIT","examples":[1],"entrypoint":{"file":"index.js"}}"#,
        );
        let root = fixture.scratch_dir("stage");
        let registry = FakeRegistry::ok();

        let (result, _) = run(&registry, &fixture, &mut ScriptedPrompter::new(), &root);
        assert!(matches!(result.unwrap_err(), HubError::Parse { .. }));
        assert!(!registry.seen().prepared);
    }

    #[test]
    fn visibility_is_prompted_when_not_given() {
        let fixture = SkillFixture::new("weather").with_valid_skill();
        let root = fixture.scratch_dir("stage");
        let registry = FakeRegistry::ok();
        let mut prompter = ScriptedPrompter::new().confirm(true).select("private");
        let progress = ProgressReporter::silent();

        let mut orchestrator = UploadOrchestrator::new(&registry, &mut prompter, &progress)
            .staging_root(&root);
        let report = orchestrator
            .run(&UploadRequest {
                visibility: None,
                ..request(&fixture)
            })
            .unwrap();

        assert_eq!(report.visibility, Visibility::Private);
    }

    #[test]
    fn node_modules_is_staged_in_full() {
        let fixture = SkillFixture::new("deps")
            .with_valid_skill()
            .file("node_modules/left-pad/index.js", "module.exports = 1;")
            .file("node_modules/left-pad/lib/util.js", "module.exports = 2;");
        let root = fixture.scratch_dir("stage");

        struct Inspecting(FakeRegistry, RefCell<Vec<String>>);
        impl Registry for Inspecting {
            fn auth_check(&self, key: &str) -> bool {
                self.0.auth_check(key)
            }
            fn user_info(&self) -> Option<UserIdentity> {
                None
            }
            fn prepare(&self, e: EntityType, v: Visibility) -> PrepareOutcome {
                self.0.prepare(e, v)
            }
            fn transfer(&self, session: &UploadSession, archive: &Path) -> bool {
                let zip = zip::ZipArchive::new(std::fs::File::open(archive).unwrap()).unwrap();
                self.1
                    .borrow_mut()
                    .extend(zip.file_names().map(ToString::to_string));
                self.0.transfer(session, archive)
            }
            fn finalize(&self, e: EntityType, id: &str, p: &FinalizePayload<'_>) -> bool {
                self.0.finalize(e, id, p)
            }
        }

        let registry = Inspecting(FakeRegistry::ok(), RefCell::default());
        let mut prompter = ScriptedPrompter::new().confirm(true);
        let progress = ProgressReporter::silent();
        UploadOrchestrator::new(&registry, &mut prompter, &progress)
            .staging_root(&root)
            .run(&request(&fixture))
            .unwrap();

        let names = registry.1.borrow();
        assert!(names.iter().any(|n| n == "node_modules/left-pad/lib/util.js"));
        assert!(names.iter().any(|n| n == "handler.js"));
        assert!(staging_is_empty(&root));
    }

    #[cfg(unix)]
    #[test]
    fn failed_staging_cleans_up_and_names_phase() {
        let fixture = SkillFixture::new("looped")
            .with_valid_skill()
            .file("node_modules/left-pad/index.js", "module.exports = 1;");
        std::os::unix::fs::symlink(
            "..",
            fixture.path().join("node_modules/left-pad/parent"),
        )
        .unwrap();
        let root = fixture.scratch_dir("stage");
        let registry = FakeRegistry::ok();
        let mut prompter = ScriptedPrompter::new().confirm(true);

        let (result, phase) = run(&registry, &fixture, &mut prompter, &root);
        let err = result.unwrap_err();

        assert!(
            err.to_string().starts_with("Error creating build directory: "),
            "{err}"
        );
        assert_eq!(phase, UploadPhase::Staging);
        assert!(registry.seen().staged_manifest.is_none());
        assert!(staging_is_empty(&root));
    }

    fn half_written_archive(_source: &Path, out: &Path) -> Result<ArchiveSummary> {
        std::fs::write(out, b"PK\x03\x04")?;
        Err(HubError::Io(std::io::Error::other("disk full")))
    }

    #[test]
    fn failed_archive_cleans_up_and_names_phase() {
        let fixture = SkillFixture::new("weather").with_valid_skill();
        let root = fixture.scratch_dir("stage");
        let registry = FakeRegistry::ok();
        let mut prompter = ScriptedPrompter::new().confirm(true);
        let progress = ProgressReporter::silent();

        let mut orchestrator = UploadOrchestrator::new(&registry, &mut prompter, &progress)
            .staging_root(&root)
            .archiver(half_written_archive);
        let err = orchestrator.run(&request(&fixture)).unwrap_err();

        assert!(
            err.to_string().starts_with("Error creating build directory: "),
            "{err}"
        );
        assert!(err.to_string().contains("disk full"), "{err}");
        assert_eq!(orchestrator.phase(), UploadPhase::Archiving);
        assert!(registry.seen().staged_manifest.is_none());
        assert!(staging_is_empty(&root));
    }
}
