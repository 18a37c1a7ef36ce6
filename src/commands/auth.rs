// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::app::App;
use crate::auth::Authenticator;
use anyhow::Result;

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    let auth = app.auth();
    match m.subcommand() {
        Some(("signup", sub)) => {
            let s = auth.sign_up(required(sub, "email")?, required(sub, "password")?)?;
            println!("Account created; signed in as {}", s.email);
        }
        Some(("signin", sub)) => {
            let s = auth.sign_in(required(sub, "email")?, required(sub, "password")?)?;
            println!("Signed in as {}", s.email);
        }
        Some(("signout", _)) => {
            auth.sign_out()?;
            println!("Signed out");
        }
        Some(("whoami", _)) => match auth.current_session()? {
            Some(s) => println!("{} (since {})", s.email, s.started_at),
            None => println!("Not signed in"),
        },
        _ => {}
    }
    Ok(())
}
