// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn json_flags(c: Command) -> Command {
    c.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id").long("id").required(true).help("Record id")
}

fn amount_arg(required: bool) -> Arg {
    Arg::new("amount")
        .long("amount")
        .required(required)
        .help("Amount, e.g. 12.50")
}

fn text_arg(name: &'static str, required: bool) -> Arg {
    Arg::new(name).long(name).required(required)
}

/// add/list/edit/rm for a collection keyed by `name_field` ("name" or "label").
fn crud(name: &'static str, about: &'static str, name_field: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(text_arg(name_field, true))
                .arg(amount_arg(true)),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(text_arg(name_field, false))
                .arg(amount_arg(false)),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
}

pub fn build_cli() -> Command {
    Command::new("nexus")
        .about("Shared household budget: charges, advances, savings and the monthly transfer")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("auth")
                .about("Sign up, sign in and out")
                .subcommand_required(true)
                .subcommand(
                    Command::new("signup")
                        .arg(text_arg("email", true))
                        .arg(text_arg("password", true)),
                )
                .subcommand(
                    Command::new("signin")
                        .arg(text_arg("email", true))
                        .arg(text_arg("password", true)),
                )
                .subcommand(Command::new("signout"))
                .subcommand(Command::new("whoami")),
        )
        .subcommand(crud("fixed", "Monthly fixed charges", "name"))
        .subcommand(crud("annual", "Yearly charges", "name"))
        .subcommand(
            crud("advance", "Pending advances owed to the household", "label")
                .subcommand(
                    Command::new("repay")
                        .arg(id_arg())
                        .arg(amount_arg(true)),
                )
                .subcommand(Command::new("absorb").arg(id_arg())),
        )
        .subcommand(crud("reimb", "Reimbursements received", "label"))
        .subcommand(crud("pay", "Exceptional payments", "label"))
        .subcommand(
            Command::new("history")
                .about("Movement log")
                .subcommand_required(true)
                .subcommand(json_flags(Command::new("list")).arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Include archived entries"),
                ))
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(
                    Command::new("archive")
                        .arg(Arg::new("id").long("id"))
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("id"),
                        ),
                ),
        )
        .subcommand(
            Command::new("savings")
                .about("Savings accounts")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(text_arg("name", true))
                        .arg(
                            Arg::new("balance")
                                .long("balance")
                                .allow_hyphen_values(true)
                                .default_value("0"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("adjust")
                        .about("Deposit (positive) or withdraw (negative)")
                        .arg(id_arg())
                        .arg(amount_arg(true).allow_hyphen_values(true)),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(text_arg("name", false))
                        .arg(Arg::new("balance").long("balance").allow_hyphen_values(true)),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("savings-advance")
                .about("Money borrowed from a savings account")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(text_arg("label", true))
                        .arg(amount_arg(true))
                        .arg(
                            Arg::new("account")
                                .long("account")
                                .required(true)
                                .help("Savings account id"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("repay")
                        .arg(id_arg())
                        .arg(amount_arg(true)),
                )
                .subcommand(Command::new("absorb").arg(id_arg()))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("personal")
                .about("Personal checklist expenses")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(text_arg("label", true))
                        .arg(amount_arg(true))
                        .arg(text_arg("comment", false)),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(text_arg("label", false))
                        .arg(amount_arg(false)),
                )
                .subcommand(Command::new("toggle").arg(id_arg()))
                .subcommand(
                    Command::new("comment")
                        .arg(id_arg())
                        .arg(text_arg("text", true)),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(json_flags(
            Command::new("summary")
                .about("Transfer per person, real cash and category totals")
                .arg(
                    Arg::new("date")
                        .long("date")
                        .help("Compute as of YYYY-MM-DD (default: today)"),
                ),
        ))
        .subcommand(json_flags(
            Command::new("projection").about("Twelve-month cash projection"),
        ))
        .subcommand(
            Command::new("config")
                .about("Household settings")
                .subcommand_required(true)
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set")
                        .arg(text_arg("key", true))
                        .arg(Arg::new("value").long("value").required(true).allow_hyphen_values(true)),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export the ledger")
                .subcommand_required(true)
                .subcommand(Command::new("snapshot").arg(text_arg("out", true)))
                .subcommand(
                    Command::new("history")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .value_parser(["csv", "json"]),
                        )
                        .arg(text_arg("out", true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check ledger consistency"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn savings_adjust_accepts_negative_amounts() {
        let m = build_cli().get_matches_from([
            "nexus", "savings", "adjust", "--id", "3", "--amount", "-40",
        ]);
        let (_, savings) = m.subcommand().unwrap();
        let (_, adjust) = savings.subcommand().unwrap();
        assert_eq!(adjust.get_one::<String>("amount").unwrap(), "-40");
    }
}
