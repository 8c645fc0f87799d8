//! Admin password hashing.
//!
//! ```bash
//! ce-cli hash-password < password.txt
//! ```
//!
//! Prints an argon2 PHC string suitable for `ADMIN_PASSWORD_HASH`.

use std::io::{self, BufRead, Write};

use contraentrega_storefront::services::auth::hash_password;

/// Read one line from stdin and print its hash to stdout.
///
/// # Errors
///
/// Returns an error if stdin cannot be read, the line is empty, or hashing
/// fails.
pub fn hash_from_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err("password must not be empty".into());
    }

    let hash = hash_password(password)?;
    writeln!(io::stdout().lock(), "{hash}")?;
    Ok(())
}
