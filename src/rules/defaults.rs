//! Built-in rule tables
//!
//! File rules are matched in `MatchMode::Anchored` against the normalised
//! path, the project-relative path and the file name. Command rules are
//! matched in `MatchMode::Search`.

use super::rule::PatternRule;

/// Message attached to user-supplied protected file patterns
pub const CUSTOM_FILE_MESSAGE: &str = "Custom protected pattern from file_protection.additional_patterns.";

/// Message attached to user-supplied dangerous command patterns
pub const CUSTOM_COMMAND_MESSAGE: &str = "Custom dangerous pattern";

const ENV_CONTEXT: &str =
    "Environment files often contain API keys, database credentials, and other secrets.";
const KEY_CONTEXT: &str = "Cryptographic key files contain sensitive security credentials.";
const SECRET_CONTEXT: &str =
    "Files with 'secret' or 'credential' in the name typically contain sensitive data.";
const SSH_CONTEXT: &str = "SSH keys and host files provide authentication access and should be protected.";
const DB_CONTEXT: &str =
    "Database files may contain sensitive user data and should be handled carefully.";
const CLOUD_CONTEXT: &str = "Credential directories hold cloud and SSH authentication material.";
const TOKEN_CONTEXT: &str = "Files named after keys, tokens or passwords usually store them in plain text.";
const SYSTEM_CONTEXT: &str = "Critical system files and pseudo-filesystems must never be modified.";

/// Rules protecting sensitive files from Write/Edit
pub fn protected_file_rules() -> Vec<PatternRule> {
    vec![
        // Critical system paths
        PatternRule::block(r"/etc/(?:passwd|shadow|sudoers)", SYSTEM_CONTEXT),
        PatternRule::block(r"/(?:boot|sys|proc)/", SYSTEM_CONTEXT),
        // Environment and secrets
        PatternRule::block(r"\.env[^/]*$", ENV_CONTEXT),
        PatternRule::block(r".*\.(?:key|pem|p12|pfx)$", KEY_CONTEXT),
        PatternRule::block(r"secrets?\.[^/]*$", SECRET_CONTEXT),
        PatternRule::block(r"credentials?\.[^/]*$", SECRET_CONTEXT),
        PatternRule::block(r"[^/]*secret[^/]*$", SECRET_CONTEXT),
        PatternRule::block(r"[^/]*credential[^/]*$", SECRET_CONTEXT),
        // SSH and crypto
        PatternRule::block(r"id_rsa[^/]*$", SSH_CONTEXT),
        PatternRule::block(r"id_ed25519[^/]*$", SSH_CONTEXT),
        PatternRule::block(r"known_hosts$", SSH_CONTEXT),
        PatternRule::block(r"authorized_keys$", SSH_CONTEXT),
        // Database
        PatternRule::block(r"[^/]*\.sqlite[^/]*$", DB_CONTEXT),
        PatternRule::block(r"[^/]*\.db$", DB_CONTEXT),
        // Credential directories
        PatternRule::block(r"(?:.*/)?\.aws/", CLOUD_CONTEXT),
        PatternRule::block(r"(?:.*/)?\.ssh/", CLOUD_CONTEXT),
        PatternRule::block(r"(?:.*/)?\.docker/config\.json$", CLOUD_CONTEXT),
        // Common secret file names
        PatternRule::block(r"api[-_]?keys?\.[^/]*$", TOKEN_CONTEXT),
        PatternRule::block(r"tokens?\.[^/]*$", TOKEN_CONTEXT),
        PatternRule::block(r"passwords?\.[^/]*$", TOKEN_CONTEXT),
    ]
}

// Shared fragments for recursive rm: any flags, a recursive flag, more flags.
const RM_RECURSIVE: &str = r"\brm\s+(?:-\S+\s+)*(?:-[a-z]*r[a-z]*|--recursive)\s+(?:-\S+\s+)*";
const END: &str = r"(?:[\s;&|)]|$)";
const PATH_END: &str = r"(?:[/\s;&|)]|$)";

/// Commands denied outright
pub fn dangerous_command_rules() -> Vec<PatternRule> {
    vec![
        // Destructive file operations
        PatternRule::block(
            format!(r"{}(?:/|/\*){}", RM_RECURSIVE, END),
            "Recursive deletion from root directory",
        ),
        PatternRule::block(
            format!(
                r"{}/(?:usr|etc|var|home|root|bin|sbin|lib|lib64|opt|boot|srv){}",
                RM_RECURSIVE, PATH_END
            ),
            "Recursive deletion of system directories",
        ),
        PatternRule::block(
            format!(r"{}\*{}", RM_RECURSIVE, END),
            "Recursive deletion with wildcards",
        ),
        PatternRule::block(
            format!(r"{}(?:~|\$HOME)/?\*?{}", RM_RECURSIVE, END),
            "Recursive deletion from home directory",
        ),
        PatternRule::block(r"\brm\s+.*--no-preserve-root", "Deletion with root protection disabled"),
        PatternRule::block(
            r">\s*/dev/(?:sd[a-z]|hd[a-z]|nvme\d|disk\d|mmcblk\d)",
            "Direct writes to disk devices",
        ),
        // System modification
        PatternRule::block(r"\bsudo\s+rm\s+(?:.*\s)?-[a-z]*r", "Sudo recursive deletion"),
        PatternRule::block(
            format!(r"\bchmod\s+(?:-\S+\s+)*0?777\s+/{}", END),
            "Overly permissive root permissions",
        ),
        PatternRule::block(
            r"\bchmod\s+(?:\S+\s+)*-[a-z]*R[a-z]*\s+(?:\S+\s+)*0?777\b",
            "Recursive world-writable permissions",
        ),
        PatternRule::block(
            r"\bchmod\s+(?:\S+\s+)*0?777\s+(?:\S+\s+)*-[a-z]*R",
            "Recursive world-writable permissions",
        ),
        PatternRule::block(
            format!(r"\bchown\s+(?:-\S+\s+)*\S+\s+/{}", END),
            "Ownership changes to root directory",
        ),
        // Fork bomb
        PatternRule::block(r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:", "Fork bomb"),
        // Network and remote execution
        PatternRule::block(r"\bnc\s+.*-e\b", "Netcat with command execution"),
        PatternRule::block(
            r"\bcurl\s+.*\|\s*(?:sudo\s+)?(?:ba|z|da)?sh\b",
            "Downloading and executing scripts",
        ),
        PatternRule::block(
            r"\bwget\s+.*\|\s*(?:sudo\s+)?(?:ba|z|da)?sh\b",
            "Downloading and executing scripts",
        ),
        PatternRule::block(r"\b(?:ba|z)?sh\s+<\(\s*(?:curl|wget)", "Bash execution from remote scripts"),
        // Formatting and partitioning
        PatternRule::block(r"\bfdisk\s+/dev/", "Disk partitioning operations"),
        PatternRule::block(r"\bmkfs(?:\.\w+)?\s", "Filesystem creation"),
        PatternRule::block(r"\bmkfs\.\w+", "Filesystem creation"),
        PatternRule::block(r"\bdd\s+.*of=/dev/", "Direct disk writes"),
        // Process manipulation
        PatternRule::block(format!(r"\bkill\s+-9\s+1{}", END), "Killing init process"),
        PatternRule::block(r"\bkillall\s+-9", "Forceful termination of all processes"),
        // System configuration
        PatternRule::block(r">\s*/etc/(?:passwd|shadow|sudoers)\b", "Modifying user accounts or passwords"),
        PatternRule::block(r"\becho\s+.*>\s*/etc/", "Writing to system configuration"),
    ]
}

/// Commands approved with a performance or caution note
pub fn performance_warning_rules() -> Vec<PatternRule> {
    vec![
        PatternRule::warn(
            format!(r"\bfind\s+/{}", END),
            "Searching from the filesystem root scans every mounted volume; narrow the starting directory",
        ),
        PatternRule::warn(
            format!(r"\bgrep\s+(?:\S+\s+)*-[a-z]*r[a-z]*\s+(?:\S+\s+)*/{}", END),
            "Recursive grep from the filesystem root is unbounded; search the project directory instead",
        ),
        PatternRule::warn(
            r"\bchmod\s+(?:\S+\s+)*-[a-z]*R",
            "Recursive chmod changes permissions on every file below the target",
        ),
        PatternRule::warn(
            r"\bfind\s+.*-name",
            "Consider using 'rg --files -g pattern' for better performance",
        ),
        PatternRule::warn(
            r"\bgrep\s+[^|]*$",
            "Consider using 'rg' (ripgrep) for faster searching",
        ),
        PatternRule::warn(
            r"\bcat\s+.*\|\s*grep",
            "Consider using 'rg pattern file' instead of 'cat file | grep pattern'",
        ),
        PatternRule::warn(
            r"\bls\s+.*\|\s*grep",
            "Consider using shell globbing or 'rg --files' instead",
        ),
    ]
}

/// Advisory suggestions for otherwise safe commands
pub fn best_practice_rules() -> Vec<PatternRule> {
    vec![
        PatternRule::warn(
            r"\bsudo\s+",
            "Consider if sudo is really necessary for this operation",
        )
        .unless(r"\bsudo\s+(?:apt|apt-get|yum|dnf|brew)\b"),
        PatternRule::warn(
            r"\bchmod\s+(?:-\S+\s+)*\d{3,4}\b",
            "Consider using symbolic permissions (e.g., 'chmod u+x') for clarity",
        ),
        PatternRule::warn(
            r"\bgit\s+push\s+(?:.*\s)?(?:--force|-f)(?:\s|$)",
            "Consider using '--force-with-lease' instead of '--force' for safer pushing",
        ),
    ]
}

/// Pick a safer alternative to suggest for a blocked command
pub fn safer_alternative(command: &str) -> &'static str {
    let lower = command.to_lowercase();

    if lower.contains("sudo") && lower.contains("rm") {
        "Double-check the path and consider using a non-destructive approach first"
    } else if lower.contains("rm -rf") || lower.contains("rm -r") {
        "Consider using 'trash' command or move files to a backup location first"
    } else if lower.contains("chmod") && lower.contains("777") {
        "Use more specific permissions like 'chmod u+rwx,g+r,o+r' instead"
    } else if (lower.contains("curl") || lower.contains("wget")) && lower.contains('|') {
        "Download the script first, review it, then execute: wget script.sh && cat script.sh && bash script.sh"
    } else if lower.contains("mkfs") || lower.contains("fdisk") || lower.contains("/dev/") {
        "Run disk and partition tools directly in your terminal after verifying the target device"
    } else {
        "Review the command carefully and consider if there's a safer approach"
    }
}

/// Explanatory context for a protected path
pub fn file_context(file_path: &str) -> &'static str {
    let lower = file_path.to_lowercase();

    if lower.contains(".env") {
        ENV_CONTEXT
    } else if [".key", ".pem", ".p12", ".pfx"].iter().any(|ext| lower.ends_with(ext)) {
        KEY_CONTEXT
    } else if lower.contains("secret") || lower.contains("credential") {
        SECRET_CONTEXT
    } else if ["id_rsa", "id_ed25519", "known_hosts", "authorized_keys"]
        .iter()
        .any(|name| lower.contains(name))
    {
        SSH_CONTEXT
    } else if lower.contains(".sqlite") || lower.ends_with(".db") {
        DB_CONTEXT
    } else {
        "This file matches patterns for sensitive data and is protected."
    }
}
