use clap::{arg, command, ArgAction, ArgMatches};
use std::env;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Once;
use tracing::{debug, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::concat::{self, Config, EntryOrder, OUTPUT_FILENAME};
use crate::error::Result;

pub fn run() -> Result<()> {
    let matches = command!()
        .about("Concatenate every file in the current directory into a single cats.txt")
        .arg(arg!(-v --verbose "Log every included and skipped entry").action(ArgAction::SetTrue))
        .arg(
            arg!(-q --quiet "Only log errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
        .arg(arg!(--unsorted "Keep the directory listing order instead of sorting by name").action(ArgAction::SetTrue))
        .get_matches();

    init_logging(&matches);

    let order = if matches.get_flag("unsorted") {
        EntryOrder::Filesystem
    } else {
        EntryOrder::Sorted
    };

    let mut config = Config::new(".").with_order(order);
    for name in own_file_names() {
        config = config.with_self_name(name);
    }
    debug!(?config, "starting");

    let summary = concat::concatenate(&config)?;
    if summary.read_errors > 0 {
        warn!(
            files = summary.files,
            read_errors = summary.read_errors,
            "some files were bundled as error lines"
        );
    }

    println!("Concatenated files from current directory to '{}'", OUTPUT_FILENAME);
    Ok(())
}

/// Names the running program goes by, so it is never bundled with the rest.
///
/// The invoked name (`argv[0]`) comes first; `current_exe` resolves symlinks,
/// so a linked copy under another name would otherwise slip through.
fn own_file_names() -> Vec<OsString> {
    let invoked = env::args_os()
        .next()
        .and_then(|arg0| Path::new(&arg0).file_name().map(|name| name.to_os_string()));
    let resolved = env::current_exe()
        .ok()
        .and_then(|exe| exe.file_name().map(|name| name.to_os_string()));

    invoked.into_iter().chain(resolved).collect()
}

fn init_logging(matches: &ArgMatches) {
    static INIT: Once = Once::new();

    let level = if matches.get_flag("verbose") {
        Level::DEBUG
    } else if matches.get_flag("quiet") {
        Level::ERROR
    } else {
        Level::WARN
    };

    INIT.call_once(|| {
        let filter = EnvFilter::new(format!("cats={}", level.as_str().to_lowercase()));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    });
}
