//! Package layout and archive serialization.

use std::fmt::Write as _;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use common::FileMetadata;
use common::config::ArchiveFormat;
use common::filename::METADATA_FILE;
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::info;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::attachment::{Attachment, AttachmentKind, AttachmentSet};
use crate::draft::TaskId;
use crate::error::PackageError;
use crate::templates::Artifacts;

const FILE_MODE: u32 = 0o644;
const SCRIPT_MODE: u32 = 0o755;
const DIR_MODE: u32 = 0o755;

#[derive(Debug, Clone)]
pub enum EntryContent {
    Text(String),
    File(Attachment),
}

/// One file in the package, addressed relative to the package root.
#[derive(Debug, Clone)]
pub struct PackageEntry {
    pub path: String,
    pub content: EntryContent,
    pub executable: bool,
}

impl PackageEntry {
    fn text(path: impl Into<String>, text: String, executable: bool) -> Self {
        Self {
            path: path.into(),
            content: EntryContent::Text(text),
            executable,
        }
    }

    async fn bytes(&self) -> Result<Vec<u8>, PackageError> {
        match &self.content {
            EntryContent::Text(text) => Ok(text.clone().into_bytes()),
            EntryContent::File(attachment) => {
                attachment
                    .read()
                    .await
                    .map_err(|source| PackageError::ReadAttachment {
                        name: attachment.name().to_string(),
                        source,
                    })
            }
        }
    }

    fn mode(&self) -> u32 {
        if self.executable { SCRIPT_MODE } else { FILE_MODE }
    }
}

/// Probed metadata for both attachment sets, in attachment order.
#[derive(Debug, Clone, Default)]
pub struct Sidecars {
    pub reference: Vec<FileMetadata>,
    pub solution: Vec<FileMetadata>,
}

/// The full file tree of a task package under `<task-id>/`.
#[derive(Debug, Clone)]
pub struct PackageTree {
    root: String,
    entries: Vec<PackageEntry>,
}

impl PackageTree {
    pub fn assemble(
        task_id: &TaskId,
        artifacts: Artifacts,
        reference_files: &AttachmentSet,
        solution_files: &AttachmentSet,
        sidecars: &Sidecars,
    ) -> Result<Self, PackageError> {
        let mut entries = vec![
            PackageEntry::text("task.yaml", artifacts.task_yaml, false),
            PackageEntry::text("solution.sh", artifacts.solution_sh, true),
            PackageEntry::text("Dockerfile", artifacts.dockerfile, false),
            PackageEntry::text("docker-compose.yaml", artifacts.docker_compose, false),
            PackageEntry::text("run-tests.sh", artifacts.run_tests_sh, true),
            PackageEntry::text("tests/test_outputs.py", artifacts.test_outputs_py, false),
        ];

        if !reference_files.is_empty() {
            push_attachments(
                &mut entries,
                AttachmentKind::Reference,
                reference_files,
                &sidecars.reference,
            )?;
        }
        push_attachments(
            &mut entries,
            AttachmentKind::Solution,
            solution_files,
            &sidecars.solution,
        )?;

        Ok(Self {
            root: task_id.as_str().to_string(),
            entries,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn entries(&self) -> &[PackageEntry] {
        &self.entries
    }

    /// Archive-relative paths, `<root>/<path>`.
    pub fn paths(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("{}/{}", self.root, e.path))
            .collect()
    }

    pub fn has_data_dir(&self) -> bool {
        self.entries.iter().any(|e| e.path.starts_with("data/"))
    }

    /// Box-drawing listing of the tree, directories after the files that
    /// precede them in archive order.
    pub fn render(&self) -> String {
        let mut nodes: Vec<(String, Vec<&str>)> = Vec::new();
        for entry in &self.entries {
            match entry.path.split_once('/') {
                Some((dir, file)) => {
                    let dir = format!("{dir}/");
                    match nodes.iter_mut().find(|(name, children)| *name == dir && !children.is_empty()) {
                        Some((_, children)) => children.push(file),
                        None => nodes.push((dir, vec![file])),
                    }
                }
                None => nodes.push((entry.path.clone(), Vec::new())),
            }
        }

        let mut out = format!("{}/\n", self.root);
        let last = nodes.len().saturating_sub(1);
        for (i, (name, children)) in nodes.iter().enumerate() {
            let (branch, indent) = if i == last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            let _ = writeln!(out, "{branch}{name}");
            let last_child = children.len().saturating_sub(1);
            for (j, child) in children.iter().enumerate() {
                let child_branch = if j == last_child { "└── " } else { "├── " };
                let _ = writeln!(out, "{indent}{child_branch}{child}");
            }
        }
        out
    }

    /// Serialize the whole tree into one compressed archive in memory.
    pub async fn to_archive(&self, format: ArchiveFormat) -> Result<Vec<u8>, PackageError> {
        let mut files = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            files.push((
                format!("{}/{}", self.root, entry.path),
                entry.mode(),
                entry.bytes().await?,
            ));
        }
        let root = self.root.clone();

        tokio::task::spawn_blocking(move || match format {
            ArchiveFormat::Zip => encode_zip(&root, &files),
            ArchiveFormat::TarGz => encode_tar_gz(&files),
        })
        .await
        .map_err(|e| PackageError::Join(e.to_string()))?
    }

    /// Write `<out_dir>/<task-id>.<ext>` and return its path.
    pub async fn write_archive(
        &self,
        format: ArchiveFormat,
        out_dir: &Path,
    ) -> Result<PathBuf, PackageError> {
        let bytes = self.to_archive(format).await?;
        tokio::fs::create_dir_all(out_dir).await?;
        let path = out_dir.join(format!("{}.{}", self.root, format.extension()));
        tokio::fs::write(&path, &bytes).await?;
        info!(
            path = %path.display(),
            bytes = bytes.len(),
            entries = self.entries.len(),
            "Task package written"
        );
        Ok(path)
    }
}

fn push_attachments(
    entries: &mut Vec<PackageEntry>,
    kind: AttachmentKind,
    files: &AttachmentSet,
    metadata: &[FileMetadata],
) -> Result<(), PackageError> {
    let dir = kind.dir_name();
    entries.push(PackageEntry::text(
        format!("{dir}/{METADATA_FILE}"),
        serde_json::to_string_pretty(metadata)?,
        false,
    ));
    for file in files {
        entries.push(PackageEntry {
            path: format!("{dir}/{}", file.name()),
            content: EntryContent::File(file.clone()),
            executable: false,
        });
    }
    Ok(())
}

type ArchiveFile = (String, u32, Vec<u8>);

fn encode_zip(root: &str, files: &[ArchiveFile]) -> Result<Vec<u8>, PackageError> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let base = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut dirs: Vec<String> = vec![format!("{root}/")];
    for (path, _, _) in files {
        if let Some((dir, _)) = path.rsplit_once('/') {
            let dir = format!("{dir}/");
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
    }
    for dir in dirs {
        writer.add_directory(dir, base.unix_permissions(DIR_MODE))?;
    }

    for (path, mode, bytes) in files {
        writer.start_file(path.as_str(), base.unix_permissions(*mode))?;
        writer.write_all(bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}

fn encode_tar_gz(files: &[ArchiveFile]) -> Result<Vec<u8>, PackageError> {
    let mtime = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, mode, bytes) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(*mode);
        header.set_mtime(mtime);
        builder.append_data(&mut header, path, bytes.as_slice())?;
    }
    Ok(builder.into_inner()?.finish()?)
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use common::config::JudgeConfig;

    use super::*;
    use crate::draft::TaskDraft;
    use crate::draft::tests::sample_draft;

    fn tree_for(draft: &TaskDraft) -> PackageTree {
        let items = draft.rubric.list_items();
        let artifacts = Artifacts::render(draft, &items, &JudgeConfig::default());
        let sidecars = Sidecars {
            reference: draft
                .reference_files
                .iter()
                .map(|f| FileMetadata::base(f.name(), f.size(), f.extension()))
                .collect(),
            solution: draft
                .solution_files
                .iter()
                .map(|f| FileMetadata::base(f.name(), f.size(), f.extension()))
                .collect(),
        };
        PackageTree::assemble(
            &TaskId::generate("sample-task"),
            artifacts,
            &draft.reference_files,
            &draft.solution_files,
            &sidecars,
        )
        .unwrap()
    }

    #[test]
    fn layout_without_reference_files() {
        let tree = tree_for(&sample_draft());
        let paths: Vec<&str> = tree.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "task.yaml",
                "solution.sh",
                "Dockerfile",
                "docker-compose.yaml",
                "run-tests.sh",
                "tests/test_outputs.py",
                "solution/metadata.json",
                "solution/answer.txt",
            ]
        );
        assert!(!tree.has_data_dir());
    }

    #[test]
    fn render_draws_tree() {
        let mut draft = sample_draft();
        draft
            .reference_files
            .add(Attachment::from_bytes("policy.pdf", b"%PDF".to_vec()))
            .unwrap();
        let tree = tree_for(&draft);
        let rendered = tree.render();
        let expected_tail = "\
├── task.yaml
├── solution.sh
├── Dockerfile
├── docker-compose.yaml
├── run-tests.sh
├── tests/
│   └── test_outputs.py
├── data/
│   ├── metadata.json
│   └── policy.pdf
└── solution/
    ├── metadata.json
    └── answer.txt
";
        assert!(rendered.starts_with(&format!("{}/\n", tree.root())));
        assert!(rendered.ends_with(expected_tail), "{rendered}");
    }

    #[tokio::test]
    async fn zip_archive_round_trips_contents_and_modes() {
        let mut draft = sample_draft();
        draft
            .reference_files
            .add(Attachment::from_bytes("input.csv", b"a,b\n".to_vec()))
            .unwrap();
        let tree = tree_for(&draft);
        let bytes = tree.to_archive(ArchiveFormat::Zip).await.unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let root = tree.root().to_string();

        let mut answer = String::new();
        archive
            .by_name(&format!("{root}/solution/answer.txt"))
            .unwrap()
            .read_to_string(&mut answer)
            .unwrap();
        assert_eq!(answer, "gaps");

        let mut sidecar = String::new();
        archive
            .by_name(&format!("{root}/data/metadata.json"))
            .unwrap()
            .read_to_string(&mut sidecar)
            .unwrap();
        let parsed: Vec<FileMetadata> = serde_json::from_str(&sidecar).unwrap();
        assert_eq!(parsed, vec![FileMetadata::base("input.csv", 4, "csv")]);
        assert!(sidecar.contains("\n  {\n"));

        let script = archive.by_name(&format!("{root}/solution.sh")).unwrap();
        assert_eq!(script.unix_mode().map(|m| m & 0o777), Some(0o755));
        assert_eq!(script.compression(), CompressionMethod::Deflated);
    }

    #[tokio::test]
    async fn tar_gz_archive_lists_every_entry() {
        let tree = tree_for(&sample_draft());
        let bytes = tree.to_archive(ArchiveFormat::TarGz).await.unwrap();

        let decoder = flate2::read::GzDecoder::new(Cursor::new(bytes));
        let mut archive = tar::Archive::new(decoder);
        let mut names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        let mut expected = tree.paths();
        names.sort();
        expected.sort();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn unreadable_attachment_aborts_packaging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answer.txt");
        tokio::fs::write(&path, b"x").await.unwrap();

        let mut draft = sample_draft();
        draft.solution_files.clear();
        draft
            .solution_files
            .add(Attachment::from_path(&path).await.unwrap())
            .unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        let tree = tree_for(&draft);
        let err = tree
            .write_archive(ArchiveFormat::Zip, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, PackageError::ReadAttachment { ref name, .. } if name == "answer.txt"));
        assert!(!dir.path().join(format!("{}.zip", tree.root())).exists());
    }
}
