use git_version::git_version;

pub fn helpdesk_version() -> &'static str {
    git_version!(
        args = ["--tags", "--always", "--dirty=-modified"],
        fallback = "unknown"
    )
}
