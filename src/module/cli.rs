//! Dynamic command-line bindings for discovered modules.
//!
//! Every declared module command is registered directly under the root as
//! `<root> <command> [flags] [args]`, with typed flags generated from the
//! manifest's flag schema. The mapping is exhaustive over the four flag
//! types; a manifest declaring anything else never gets this far (manifest
//! parsing rejects it).

use std::collections::HashMap;

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgMatches, Command};

use super::{FlagType, FlagValue, ModuleCommand, ModuleFlag, ModuleResult};

/// Name of the trailing free-argument binding on generated commands.
const FREE_ARGS: &str = "args";

/// Build the clap command for one declared module command.
pub fn subcommand_for(spec: &ModuleCommand) -> Command {
    let mut cmd = Command::new(spec.name.clone()).about(spec.description.clone());

    if let Some(usage) = &spec.usage {
        cmd = cmd.override_usage(usage.clone());
    }
    if !spec.examples.is_empty() {
        cmd = cmd.after_help(spec.examples.join("\n"));
    }

    for flag in &spec.flags {
        cmd = cmd.arg(flag_arg(flag));
    }

    cmd.arg(Arg::new(FREE_ARGS).num_args(0..).help("Arguments passed through to the module"))
}

/// Map one declared flag to a typed clap argument.
fn flag_arg(flag: &ModuleFlag) -> Arg {
    let mut arg = Arg::new(flag.name.clone())
        .long(flag.name.clone())
        .help(flag.description.clone());

    if let Some(short) = flag.short {
        arg = arg.short(short);
    }

    match flag.flag_type {
        FlagType::String => {
            arg = arg.action(ArgAction::Set);
            arg = if flag.enum_values.is_empty() {
                arg.value_parser(clap::value_parser!(String))
            } else {
                arg.value_parser(PossibleValuesParser::new(flag.enum_values.clone()))
            };
            if let Some(FlagValue::String(default)) = &flag.default {
                arg = arg.default_value(default.clone());
            }
            // A default satisfies required-ness; clap forbids combining them.
            arg = arg.required(flag.required && flag.default.is_none());
        }
        FlagType::Int => {
            arg = arg.action(ArgAction::Set).value_parser(clap::value_parser!(i64));
            if let Some(FlagValue::Int(default)) = &flag.default {
                arg = arg.default_value(default.to_string());
            }
            arg = arg.required(flag.required && flag.default.is_none());
        }
        FlagType::Bool => {
            // Optional-value form so a `default: true` manifest value stays
            // expressible: bare `--flag` means true, `--flag=false` unsets.
            let default = matches!(flag.default, Some(FlagValue::Bool(true)));
            arg = arg
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(bool))
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .default_value(if default { "true" } else { "false" });
        }
        FlagType::StringList => {
            arg = arg
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(String))
                .value_delimiter(',');
            if let Some(FlagValue::StringList(defaults)) = &flag.default {
                arg = arg.default_values(defaults.clone());
            }
        }
    }

    arg
}

/// Decode parsed matches back into typed flag values.
///
/// Flags that were neither provided nor defaulted are omitted from the map.
pub fn decode_flags(
    spec: &ModuleCommand,
    matches: &ArgMatches,
) -> ModuleResult<HashMap<String, FlagValue>> {
    let mut flags = HashMap::new();

    for flag in &spec.flags {
        let value = match flag.flag_type {
            FlagType::String => {
                matches.get_one::<String>(&flag.name).map(|v| FlagValue::String(v.clone()))
            }
            FlagType::Int => matches.get_one::<i64>(&flag.name).map(|v| FlagValue::Int(*v)),
            FlagType::Bool => matches.get_one::<bool>(&flag.name).map(|v| FlagValue::Bool(*v)),
            FlagType::StringList => matches
                .get_many::<String>(&flag.name)
                .map(|values| FlagValue::StringList(values.cloned().collect())),
        };

        if let Some(value) = value {
            flags.insert(flag.name.clone(), value);
        }
    }

    Ok(flags)
}

/// Extract the trailing free arguments from parsed matches.
pub fn free_args(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>(FREE_ARGS)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(name: &str, flag_type: FlagType, default: Option<FlagValue>) -> ModuleFlag {
        ModuleFlag {
            name: name.to_string(),
            short: None,
            flag_type,
            default,
            required: false,
            description: String::new(),
            enum_values: vec![],
        }
    }

    fn spec_with(flags: Vec<ModuleFlag>) -> ModuleCommand {
        ModuleCommand {
            name: "run".to_string(),
            description: "Run it".to_string(),
            usage: None,
            flags,
            examples: vec![],
        }
    }

    fn parse(spec: &ModuleCommand, argv: &[&str]) -> ArgMatches {
        let mut full = vec!["run"];
        full.extend(argv);
        subcommand_for(spec).try_get_matches_from(full).unwrap()
    }

    #[test]
    fn test_default_round_trip_all_types() {
        let spec = spec_with(vec![
            flag("name", FlagType::String, Some(FlagValue::String("abc".into()))),
            flag("count", FlagType::Int, Some(FlagValue::Int(7))),
            flag("force", FlagType::Bool, Some(FlagValue::Bool(true))),
            flag(
                "exclude",
                FlagType::StringList,
                Some(FlagValue::StringList(vec!["a".into(), "b".into()])),
            ),
        ]);

        let matches = parse(&spec, &[]);
        let flags = decode_flags(&spec, &matches).unwrap();

        assert_eq!(flags["name"], FlagValue::String("abc".into()));
        assert_eq!(flags["count"], FlagValue::Int(7));
        assert_eq!(flags["force"], FlagValue::Bool(true));
        assert_eq!(flags["exclude"], FlagValue::StringList(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let spec = spec_with(vec![
            flag("name", FlagType::String, Some(FlagValue::String("abc".into()))),
            flag("count", FlagType::Int, Some(FlagValue::Int(7))),
            flag("force", FlagType::Bool, Some(FlagValue::Bool(false))),
            flag("exclude", FlagType::StringList, None),
        ]);

        let matches =
            parse(&spec, &["--name", "xyz", "--count", "42", "--force", "--exclude", "x,y"]);
        let flags = decode_flags(&spec, &matches).unwrap();

        assert_eq!(flags["name"], FlagValue::String("xyz".into()));
        assert_eq!(flags["count"], FlagValue::Int(42));
        assert_eq!(flags["force"], FlagValue::Bool(true));
        assert_eq!(flags["exclude"], FlagValue::StringList(vec!["x".into(), "y".into()]));
    }

    #[test]
    fn test_bool_can_be_unset_with_equals() {
        let spec = spec_with(vec![flag("force", FlagType::Bool, Some(FlagValue::Bool(true)))]);

        let matches = parse(&spec, &["--force=false"]);
        let flags = decode_flags(&spec, &matches).unwrap();
        assert_eq!(flags["force"], FlagValue::Bool(false));
    }

    #[test]
    fn test_required_flag_enforced_by_frontend() {
        let mut required = flag("prompt", FlagType::String, None);
        required.required = true;
        let spec = spec_with(vec![required]);

        let result = subcommand_for(&spec).try_get_matches_from(["run"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_enum_values_validated() {
        let mut provider = flag("provider", FlagType::String, None);
        provider.enum_values = vec!["aws".into(), "azure".into(), "gcp".into()];
        let spec = spec_with(vec![provider]);

        assert!(subcommand_for(&spec)
            .try_get_matches_from(["run", "--provider", "aws"])
            .is_ok());
        assert!(subcommand_for(&spec)
            .try_get_matches_from(["run", "--provider", "digitalocean"])
            .is_err());
    }

    #[test]
    fn test_short_alias() {
        let mut with_short = flag("provider", FlagType::String, None);
        with_short.short = Some('p');
        let spec = spec_with(vec![with_short]);

        let matches = parse(&spec, &["-p", "gcp"]);
        let flags = decode_flags(&spec, &matches).unwrap();
        assert_eq!(flags["provider"], FlagValue::String("gcp".into()));
    }

    #[test]
    fn test_omitted_optional_flag_absent_from_map() {
        let spec = spec_with(vec![flag("name", FlagType::String, None)]);
        let matches = parse(&spec, &[]);
        let flags = decode_flags(&spec, &matches).unwrap();
        assert!(!flags.contains_key("name"));
    }

    #[test]
    fn test_free_args_collected() {
        let spec = spec_with(vec![]);
        let matches = parse(&spec, &["./infra", "extra"]);
        assert_eq!(free_args(&matches), vec!["./infra", "extra"]);
    }
}
