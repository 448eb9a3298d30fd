use assert_cmd::Command;
use std::path::Path;

pub fn run_revdiff_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("revdiff").expect("Failed to find revdiff binary");
    cmd.envs(vec![("NO_PAGER", "1"), ("NO_COLOR", "1"), ("RUST_LOG", "warn")]);
    cmd.env_remove("REVDIFF_REPOSITORY");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn run_git_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir);
    cmd.envs(vec![
        ("GIT_CONFIG_GLOBAL", "/dev/null"),
        ("GIT_CONFIG_NOSYSTEM", "1"),
        ("GIT_AUTHOR_DATE", "2023-01-01 12:00:00 +0000"),
        ("GIT_COMMITTER_DATE", "2023-01-01 12:00:00 +0000"),
    ]);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

/// Run git, assert success and return its trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = run_git_command(dir, args).assert().success();
    String::from_utf8_lossy(&output.get_output().stdout)
        .trim()
        .to_string()
}

#[derive(Debug, Clone)]
struct RandomAuthor {
    name: String,
    email: String,
}

fn generate_random_author() -> RandomAuthor {
    use fake::Fake;
    use fake::faker::internet::en::FreeEmail;
    use fake::faker::name::en::Name;

    RandomAuthor {
        name: Name().fake::<String>().replace(' ', "_"),
        email: FreeEmail().fake::<String>(),
    }
}

pub fn git_init(dir: &Path) {
    git(dir, &["-c", "init.defaultBranch=main", "init", "-q"]);
}

/// Stage everything in the working tree and commit it with a random author.
pub fn git_commit_all(dir: &Path, message: &str) -> String {
    let author = generate_random_author();
    let user_name = format!("user.name={}", author.name);
    let user_email = format!("user.email={}", author.email);

    git(dir, &["add", "-A"]);
    git(
        dir,
        &[
            "-c",
            &user_name,
            "-c",
            &user_email,
            "-c",
            "commit.gpgsign=false",
            "commit",
            "-q",
            "-m",
            message,
        ],
    );

    git(dir, &["rev-parse", "HEAD"])
}

pub fn git_tag(dir: &Path, name: &str, annotated: bool) {
    if annotated {
        git(
            dir,
            &[
                "-c",
                "user.name=tagger",
                "-c",
                "user.email=tagger@example.com",
                "-c",
                "tag.gpgsign=false",
                "tag",
                "-a",
                name,
                "-m",
                &format!("release {name}"),
            ],
        );
    } else {
        git(dir, &["tag", name]);
    }
}
