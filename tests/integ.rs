#![cfg(unix)]

use anyhow::Result;
use lockstep::{App, Args, Pipeline, RunOutcome, Status};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const BASIC: &str = "\
pipeline.name=demo
input.paths=reads
#Module ImportSeqs AS import
#Module Command AS count
count.inputKind=fastq
count.outputKind=table
count.command=ls $LOCKSTEP_INPUT_INPUT > counts.tsv
";

fn basic_args(config: &Path, pipelines: &Path) -> Args {
    Args {
        config: config.to_str().unwrap().to_owned(),
        pipelines: pipelines.to_str().unwrap().to_owned(),
        restart: None,
        status: None,
        precheck: false,
        docker: false,
        yes: true,
        verbose: 1,
        dry_run: false,
    }
}

/// Temp workspace holding a config file, a reads dir, and a pipelines dir.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(config: &str) -> Result<Self> {
        simple_logging::log_to_stderr(log::LevelFilter::Trace);
        let dir = tempdir()?;
        let reads = dir.path().join("reads");
        fs::create_dir(&reads)?;
        fs::write(reads.join("s1.fastq"), "@r1\nACGT\n+\nIIII\n")?;
        fs::write(reads.join("s2.fastq"), "@r2\nTTGA\n+\nIIII\n")?;
        fs::write(dir.path().join("pipeline.properties"), config)?;
        Ok(Self { dir })
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("pipeline.properties")
    }

    fn pipelines(&self) -> PathBuf {
        self.dir.path().join("pipelines")
    }

    fn root(&self) -> PathBuf {
        self.pipelines().join("demo")
    }

    fn args(&self) -> Args {
        basic_args(&self.config(), &self.pipelines())
    }

    fn run(&self, args: Args) -> Result<Option<RunOutcome>> {
        let settings = args.try_into()?;
        App::new(settings).run()
    }

    fn run_new(&self) -> Result<Option<RunOutcome>> {
        self.run(self.args())
    }

    fn restart(&self) -> Result<Option<RunOutcome>> {
        let mut args = self.args();
        args.restart = Some(self.root().to_str().unwrap().to_owned());
        self.run(args)
    }

    fn status_of(&self, module_dir: &str) -> Status {
        lockstep_status(&self.root().join(module_dir))
    }
}

fn lockstep_status(dir: &Path) -> Status {
    let markers = [
        ("lockstepStarted", Status::Started),
        ("lockstepFailed", Status::Failed),
        ("lockstepComplete", Status::Complete),
        ("precheckStarted", Status::PrecheckStarted),
        ("precheckComplete", Status::PrecheckComplete),
        ("precheckFailed", Status::PrecheckFailed),
    ];
    markers
        .iter()
        .find(|(m, _)| dir.join(m).exists())
        .map(|(_, s)| *s)
        .unwrap_or(Status::NotStarted)
}

#[test]
fn test_fresh_run() -> Result<()> {
    let ws = Workspace::new(BASIC)?;
    assert_eq!(ws.run_new()?, Some(RunOutcome::Complete));

    let root = ws.root();
    assert!(root.join("MASTER_demo.properties").exists(), "master config written");
    assert!(root.join("00_import/output/s1.fastq").exists(), "reads imported");
    assert!(root.join("00_import/output/s2.fastq").exists(), "reads imported");
    assert!(root.join("01_count/log/stdout.txt").exists(), "logs captured");

    let counts = fs::read_to_string(root.join("01_count/output/counts.tsv"))?;
    assert_eq!(counts, "s1.fastq\ns2.fastq\n");

    assert_eq!(ws.status_of("00_import"), Status::Complete);
    assert_eq!(ws.status_of("01_count"), Status::Complete);

    let pipeline = Pipeline::open(&root)?;
    assert_eq!(pipeline.name(), "demo");
    assert_eq!(pipeline.status(), Status::Complete);
    Ok(())
}

#[test]
fn test_existing_pipeline_is_not_overwritten() -> Result<()> {
    let ws = Workspace::new(BASIC)?;
    ws.run_new()?;
    assert!(ws.run_new().is_err(), "second fresh run refuses to reuse the dir");
    Ok(())
}

#[test]
fn test_stop_then_restart() -> Result<()> {
    let ws = Workspace::new(
        "\
pipeline.name=demo
#Module Command AS first
first.command=echo 1 >> runs.txt
#Module Stop
#Module Command AS second
second.command=echo 2 > done.txt
",
    )?;
    assert_eq!(ws.run_new()?, Some(RunOutcome::Stopped("Stop".to_owned())));
    assert_eq!(ws.status_of("00_first"), Status::Complete);
    assert_eq!(ws.status_of("01_Stop"), Status::Complete);
    assert_eq!(ws.status_of("02_second"), Status::Started);
    assert_eq!(lockstep_status(&ws.root()), Status::Started);
    assert!(!ws.root().join("02_second/output/done.txt").exists());

    assert_eq!(ws.restart()?, Some(RunOutcome::Complete));
    let runs = fs::read_to_string(ws.root().join("00_first/output/runs.txt"))?;
    assert_eq!(runs, "1\n", "complete module was not run again");
    assert!(ws.root().join("02_second/output/done.txt").exists());
    assert_eq!(lockstep_status(&ws.root()), Status::Complete);
    Ok(())
}

#[test]
fn test_failure_then_resume() -> Result<()> {
    let ws = Workspace::new(
        "\
pipeline.name=demo
#Module Command AS setup
setup.command=echo ok >> ok.txt
#Module Command AS gate
gate.command=test -f ../../go
",
    )?;
    assert!(ws.run_new().is_err());
    assert_eq!(ws.status_of("00_setup"), Status::Complete);
    assert_eq!(ws.status_of("01_gate"), Status::Failed);
    assert_eq!(lockstep_status(&ws.root()), Status::Failed);

    fs::write(ws.root().join("go"), "")?;
    assert_eq!(ws.restart()?, Some(RunOutcome::Complete));
    assert_eq!(ws.status_of("01_gate"), Status::Complete);
    assert_eq!(fs::read_to_string(ws.root().join("00_setup/output/ok.txt"))?, "ok\n");
    Ok(())
}

#[test]
fn test_precheck_reports_every_failure() -> Result<()> {
    let ws = Workspace::new(
        "\
pipeline.name=demo
#Module Command AS good
good.command=echo hi > hi.txt
#Module Command AS nocommand
#Module Command AS needstable
needstable.command=true
needstable.inputKind=table
",
    )?;
    let mut args = ws.args();
    args.precheck = true;
    assert!(ws.run(args).is_err());

    assert_eq!(ws.status_of("00_good"), Status::PrecheckComplete);
    assert_eq!(ws.status_of("01_nocommand"), Status::PrecheckFailed);
    assert_eq!(ws.status_of("02_needstable"), Status::PrecheckFailed);
    assert!(!ws.root().join("00_good/output/hi.txt").exists(), "precheck runs nothing");

    let pipeline = Pipeline::open(&ws.root())?;
    assert!(pipeline.is_precheck());
    assert_eq!(pipeline.status(), Status::PrecheckFailed);
    Ok(())
}

#[test]
fn test_precheck_then_run() -> Result<()> {
    let ws = Workspace::new(BASIC)?;
    let mut args = ws.args();
    args.precheck = true;
    assert_eq!(ws.run(args)?, Some(RunOutcome::PrecheckComplete));
    assert_eq!(lockstep_status(&ws.root()), Status::PrecheckComplete);
    assert!(!ws.root().join("00_import/output/s1.fastq").exists());

    assert_eq!(ws.restart()?, Some(RunOutcome::Complete));
    assert_eq!(ws.status_of("01_count"), Status::Complete);
    Ok(())
}

#[test]
fn test_strict_import_rejects_other_files() -> Result<()> {
    let ws = Workspace::new(BASIC)?;
    fs::write(ws.dir.path().join("reads/notes.txt"), "not reads")?;
    assert!(ws.run_new().is_err());
    assert_eq!(ws.status_of("00_import"), Status::Failed);
    assert!(!ws.root().join("00_import/output/s1.fastq").exists());
    Ok(())
}

#[test]
fn test_status_and_invalid_pipelines() -> Result<()> {
    let ws = Workspace::new(BASIC)?;
    ws.run_new()?;

    let mut args = ws.args();
    args.status = Some(ws.root().to_str().unwrap().to_owned());
    assert_eq!(ws.run(args)?, None);

    let mut args = ws.args();
    args.restart = Some(ws.pipelines().to_str().unwrap().to_owned());
    assert!(ws.run(args).is_err(), "pipelines dir is not itself a pipeline");
    Ok(())
}

#[test]
fn test_dry_run_touches_nothing() -> Result<()> {
    let ws = Workspace::new(BASIC)?;
    let mut args = ws.args();
    args.dry_run = true;
    assert_eq!(ws.run(args)?, None);
    assert!(!ws.root().exists());
    Ok(())
}
