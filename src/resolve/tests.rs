use std::fs;
use std::path::Path;

use anyhow::Result;
use tempfile::{tempdir, TempDir};

use contract::ModuleId;
use mount::PathMapper;

use super::*;
use crate::config::Config;
use crate::context::RunContext;
use crate::fs::Fs;

fn context(dir: &TempDir, config: &str) -> Result<RunContext> {
    let config = Config::parse(config)?;
    let fs = Fs::new(&dir.path().join("pipe"), false);
    RunContext::new("test", config, fs, PathMapper::Identity, false)
}

fn bound_module(ctx: &RunContext, id: usize) -> Result<Vec<BoundInput>> {
    ctx.resolver().resolve(ModuleId::from(id))
}

fn touch(dir: &Path, name: &str) -> Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(name), "x")?;
    Ok(())
}

#[test]
fn test_nearest_earlier_output_wins() -> Result<()> {
    let dir = tempdir()?;
    let ctx = context(
        &dir,
        "#Module Command AS a\na.outputKind=fastq\n\
         #Module Command AS b\nb.outputKind=fastq\n\
         #Module Command AS c\nc.inputKind=fastq\n",
    )?;
    let bindings = bound_module(&ctx, 2)?;
    assert_eq!(bindings.len(), 1);
    match bindings[0].sources() {
        [InputSource::Module { id, output, .. }] => {
            assert_eq!(*id, ModuleId::from(1));
            assert_eq!(output, "output");
        }
        other => panic!("unexpected sources {other:?}"),
    }
    Ok(())
}

#[test]
fn test_produced_by_filter_skips_nearer_outputs() -> Result<()> {
    let dir = tempdir()?;
    let ctx = context(
        &dir,
        "#Module Command AS a\na.outputKind=fastq\n\
         #Module Command AS b\nb.outputKind=fastq\n\
         #Module Command AS c\nc.inputKind=fastq\nc.inputFrom=a\n",
    )?;
    let bindings = bound_module(&ctx, 2)?;
    assert!(matches!(
        bindings[0].sources(),
        [InputSource::Module { id, .. }] if *id == ModuleId::from(0)
    ));
    Ok(())
}

#[test]
fn test_later_modules_are_never_sources() -> Result<()> {
    let dir = tempdir()?;
    let ctx = context(
        &dir,
        "#Module Command AS a\na.inputKind=table\n\
         #Module Command AS b\nb.outputKind=table\n",
    )?;
    let err = bound_module(&ctx, 0).unwrap_err();
    match err.downcast_ref::<Error>() {
        Some(Error::UnresolvedInput { module, input }) => {
            assert_eq!(module, "a");
            assert_eq!(input, "input");
        }
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[test]
fn test_external_paths() -> Result<()> {
    let dir = tempdir()?;
    let reads = dir.path().join("reads");
    touch(&reads, "s1.fastq")?;
    touch(&reads, "notes.txt")?;
    touch(&reads, ".hidden")?;
    fs::create_dir(reads.join("nested"))?;

    let ctx = context(
        &dir,
        &format!("input.paths={}\n#Module ImportSeqs AS import\n", reads.display()),
    )?;
    let bindings = bound_module(&ctx, 0)?;
    let paths = bindings[0].paths();
    assert_eq!(paths, vec![reads.join("notes.txt"), reads.join("s1.fastq")]);
    Ok(())
}

#[test]
fn test_earlier_pipeline_as_input() -> Result<()> {
    let dir = tempdir()?;
    let old = dir.path().join("old");
    fs::create_dir(&old)?;
    fs::write(old.join("MASTER_old.properties"), "#Module ImportSeqs\n")?;
    touch(&old.join("00_done/output"), "s1.fastq")?;
    fs::write(old.join("00_done/lockstepComplete"), "")?;
    touch(&old.join("01_failed/output"), "s2.fastq")?;
    fs::write(old.join("01_failed/lockstepFailed"), "")?;

    let ctx = context(
        &dir,
        &format!("input.paths={}\n#Module ImportSeqs AS import\n", old.display()),
    )?;
    let bindings = bound_module(&ctx, 0)?;
    let paths = bindings[0].paths();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].ends_with("00_done/output/s1.fastq"));
    Ok(())
}

#[test]
fn test_metadata_column() -> Result<()> {
    let dir = tempdir()?;
    let table = dir.path().join("meta.tsv");
    fs::write(&table, "SampleID\tBodySite\ns1\tgut\n")?;

    let ctx = context(
        &dir,
        &format!(
            "metadata.file={}\n\
             #Module Command AS site\nsite.inputKind=metadata:BodySite\n\
             #Module Command AS age\nage.inputKind=metadata:Age\n",
            table.display()
        ),
    )?;
    let bindings = bound_module(&ctx, 0)?;
    assert_eq!(
        bindings[0].sources(),
        &[InputSource::MetadataColumn {
            column: "BodySite".into(),
            table: table.clone(),
        }]
    );
    assert!(bindings[0].is_ready(&ctx.fs));

    assert!(bound_module(&ctx, 1).is_err());
    Ok(())
}

#[test]
fn test_single_slot_binds_once() -> Result<()> {
    let dir = tempdir()?;
    let ctx = context(&dir, "#Module Command AS c\nc.inputKind=fastq\n")?;
    let input = ctx.modules.get(ModuleId::from(0)).unwrap().module.inputs().get("input").unwrap();

    let mut bound = BoundInput::new(input);
    bound.bind(InputSource::Path("/a.fastq".into()))?;
    let err = bound.bind(InputSource::Path("/b.fastq".into())).unwrap_err();
    assert!(matches!(err, Error::AlreadyBound(label) if label == "input"));
    Ok(())
}

#[test]
fn test_module_source_ready_only_when_complete() -> Result<()> {
    let dir = tempdir()?;
    let mut ctx = context(
        &dir,
        "#Module Command AS a\na.outputKind=table\n\
         #Module Command AS b\nb.inputKind=table\n",
    )?;
    ctx.bootstrap()?;
    let bindings = bound_module(&ctx, 1)?;
    assert!(matches!(
        check_ready("b", &bindings, &ctx.fs),
        Err(Error::NotReady { .. })
    ));

    let a_dir = ctx.modules.get(ModuleId::from(0)).unwrap().dirs.root.clone();
    ctx.fs.set_status(&a_dir, crate::fs::Status::Complete)?;
    check_ready("b", &bindings, &ctx.fs)?;
    Ok(())
}

#[test]
fn test_single_slot_rejects_many_external_files() -> Result<()> {
    let dir = tempdir()?;
    let reads = dir.path().join("reads");
    touch(&reads, "s1.fastq")?;
    touch(&reads, "s2.fastq")?;

    let ctx = context(
        &dir,
        &format!("input.paths={}\n#Module Command AS c\nc.inputKind=fastq\n", reads.display()),
    )?;
    let err = bound_module(&ctx, 0).unwrap_err();
    assert!(
        matches!(err.downcast_ref::<Error>(), Some(Error::AlreadyBound(label)) if label == "input"),
        "{err:#}"
    );

    // naming one file is unambiguous:
    let one = reads.join("s2.fastq");
    let ctx = context(
        &dir,
        &format!("input.paths={}\n#Module Command AS c\nc.inputKind=fastq\n", one.display()),
    )?;
    assert_eq!(bound_module(&ctx, 0)?[0].paths(), vec![one]);
    Ok(())
}

#[test]
fn test_optional_input_without_source() -> Result<()> {
    let dir = tempdir()?;
    let ctx = context(&dir, "#Module Command AS c\nc.inputKind=table\nc.inputOptional=true\n")?;
    let bindings = bound_module(&ctx, 0)?;
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].label(), "input");
    assert!(!bindings[0].is_bound());
    assert!(bindings[0].is_ready(&ctx.fs));
    Ok(())
}
