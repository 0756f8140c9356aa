//! Running the filter over stylesheets on disk.

/// A single stylesheet to minify and where to put the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Job {
    pub src: PathBuf,
    pub dest: PathBuf,
}

/// Expand the given inputs into jobs writing into `out_dir`.
///
/// Files map to `out_dir/<file name>`; directories are searched recursively for `.css` files,
/// keeping their layout relative to the directory. `out_dir` itself is never searched.
pub(crate) fn jobs(inputs: &[PathBuf], out_dir: &Path) -> anyhow::Result<Vec<Job>> {
    let mut jobs = Vec::new();
    let out_dir_canonical = out_dir.canonicalize().ok();
    let is_out_dir = |path: &Path| {
        path == out_dir
            || (out_dir_canonical.is_some() && path.canonicalize().ok() == out_dir_canonical)
    };

    for input in inputs {
        if !input.is_dir() {
            let name = input
                .file_name()
                .with_context(|| format!("`{}` has no file name", input.display()))?;
            jobs.push(Job {
                src: input.clone(),
                dest: out_dir.join(name),
            });
            continue;
        }

        let walk = WalkDir::new(input)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !(entry.file_type().is_dir() && is_out_dir(entry.path())));
        for entry in walk {
            let entry = entry?;
            if !entry.file_type().is_file() || entry.path().extension() != Some("css".as_ref()) {
                continue;
            }
            let src = entry.into_path();
            let relative = src.strip_prefix(input).with_context(|| {
                format!(
                    "failed to strip prefix {} from {}",
                    input.display(),
                    src.display()
                )
            })?;
            jobs.push(Job {
                dest: out_dir.join(relative),
                src,
            });
        }
    }

    Ok(jobs)
}

/// Whether `job` has to be run again.
fn stale(job: &Job) -> bool {
    let dest_modified = Modified::path(&job.dest);
    Modified::path(&job.src) >= dest_modified || Modified::exe() >= dest_modified
}

/// Run every job, returning how many of them failed.
pub(crate) fn run_all(filter: &impl Filter, jobs: &[Job], force: bool) -> usize {
    let mut failed = 0;
    for job in jobs {
        if !force && !stale(job) {
            log::debug!("{} is up to date", job.dest.display());
            continue;
        }
        if log_errors(run(filter, job)).is_err() {
            failed += 1;
        }
    }
    failed
}

#[context("failed to minify `{}`", job.src.display())]
fn run(filter: &impl Filter, job: &Job) -> anyhow::Result<()> {
    let asset = filter_file(filter, &job.src)?;
    write_file(&job.dest, asset.content())?;
    log::info!("successfully emitted {}", job.dest.display());
    Ok(())
}

/// Load the file at `path` and pass it through both phases of `filter`.
pub(crate) fn filter_file(filter: &impl Filter, path: &Path) -> anyhow::Result<FileAsset> {
    let mut asset = FileAsset::load(path)?;
    filter.load(&mut asset)?;
    if let Err(e) = filter.dump(&mut asset) {
        if let FilterError::ExecutionFailed { input, .. } = &e {
            log::debug!("rejected input:\n{}", String::from_utf8_lossy(input));
        }
        return Err(e.into());
    }
    Ok(asset)
}

#[cfg(test)]
mod tests {
    /// Uppercases its input; fails on inputs containing `!`.
    struct Upper;

    impl Filter for Upper {
        fn dump(&self, asset: &mut dyn Asset) -> Result<(), FilterError> {
            if asset.content().contains(&b'!') {
                return Err(FilterError::ExecutionFailed {
                    code: Some(1),
                    stderr: "bang".to_owned(),
                    input: asset.content().to_vec(),
                });
            }
            let upper = asset.content().to_ascii_uppercase();
            asset.set_content(upper);
            Ok(())
        }
    }

    #[test]
    fn jobs_from_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.css"), "a{}").unwrap();
        fs::write(src.join("nested/b.css"), "b{}").unwrap();
        fs::write(src.join("readme.md"), "").unwrap();
        let single = dir.path().join("single.css");
        fs::write(&single, "c{}").unwrap();

        let out = dir.path().join("out");
        let jobs = jobs(&[src.clone(), single.clone()], &out).unwrap();
        assert_eq!(
            jobs,
            [
                Job {
                    src: src.join("a.css"),
                    dest: out.join("a.css"),
                },
                Job {
                    src: src.join("nested/b.css"),
                    dest: out.join("nested/b.css"),
                },
                Job {
                    src: single,
                    dest: out.join("single.css"),
                },
            ]
        );
    }

    #[test]
    fn out_dir_inside_input_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let css = dir.path().join("css");
        fs::create_dir_all(css.join("dist")).unwrap();
        fs::write(css.join("a.css"), "a{}").unwrap();
        // output of an earlier run
        fs::write(css.join("dist/a.css"), "A{}").unwrap();

        let expected = [Job {
            src: css.join("a.css"),
            dest: css.join("dist/a.css"),
        }];
        assert_eq!(jobs(&[css.clone()], &css.join("dist")).unwrap(), expected);

        // the same directory, spelled differently
        let found = jobs(&[css.clone()], &css.join("dist/../dist")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].src, css.join("a.css"));
    }

    #[test]
    fn repeated_runs_stay_put() {
        let dir = tempfile::tempdir().unwrap();
        let css = dir.path().join("css");
        fs::create_dir_all(&css).unwrap();
        fs::write(css.join("a.css"), "a{}").unwrap();
        let out = css.join("dist");

        for _ in 0..3 {
            let jobs = jobs(&[css.clone()], &out).unwrap();
            assert_eq!(run_all(&Upper, &jobs, true), 0);
        }
        assert_eq!(fs::read(out.join("a.css")).unwrap(), b"A{}");
        assert!(!out.join("dist").exists());
    }

    #[test]
    fn runs_and_skips_fresh_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.css");
        fs::write(&src, "a{}").unwrap();
        fs::File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(60))
            .unwrap();
        let jobs = jobs(&[src], &dir.path().join("out")).unwrap();

        assert_eq!(run_all(&Upper, &jobs, false), 0);
        assert_eq!(fs::read(&jobs[0].dest).unwrap(), b"A{}");

        // a fresh output is left alone
        fs::write(&jobs[0].dest, "untouched").unwrap();
        assert_eq!(run_all(&Upper, &jobs, false), 0);
        assert_eq!(fs::read(&jobs[0].dest).unwrap(), b"untouched");

        assert_eq!(run_all(&Upper, &jobs, true), 0);
        assert_eq!(fs::read(&jobs[0].dest).unwrap(), b"A{}");
    }

    #[test]
    fn failures_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.css");
        let bad = dir.path().join("bad.css");
        fs::write(&good, "a{}").unwrap();
        fs::write(&bad, "a{}!").unwrap();
        let jobs = jobs(&[good, bad], &dir.path().join("out")).unwrap();

        assert_eq!(run_all(&Upper, &jobs, true), 1);
        assert!(jobs[0].dest.exists());
        assert!(!jobs[1].dest.exists());
    }

    #[test]
    fn filter_error_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.css");
        fs::write(&bad, "!").unwrap();
        let e = filter_file(&Upper, &bad).unwrap_err();
        assert!(matches!(
            e.downcast_ref::<FilterError>(),
            Some(FilterError::ExecutionFailed { code: Some(1), .. })
        ));
    }

    use super::filter_file;
    use super::jobs;
    use super::run_all;
    use super::Job;
    use crate::error::FilterError;
    use crate::filter::Filter;
    use crate::util::asset::Asset;
    use std::fs;
    use std::time::Duration;
    use std::time::SystemTime;
}

use crate::error::FilterError;
use crate::filter::Filter;
use crate::util::asset::Asset as _;
use crate::util::asset::FileAsset;
use crate::util::asset::Modified;
use crate::util::log_errors;
use crate::util::write_file;
use anyhow::Context as _;
use fn_error_context::context;
use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;
