use std::path::Path;
use std::io::IsTerminal;
use std::sync::Mutex;

use once_cell::sync::OnceCell;
use shared::{
    anyhow,
    Result,
    log::LevelFilter,
};
use log4rs::{
    append::{
        console::{
            ConsoleAppender,
            Target,
        },
        file::FileAppender,
    },
    config::{
        Appender,
        Config,
        Root,
    },
    encode::pattern::PatternEncoder,
    init_config,
    Handle,
};

const ENCODE_STR: &str = "{d(%Y-%m-%d %H:%M:%S)} [{h({l:>5})}] {m}{n}";
const GLOBAL_LOG: &str = "./mixtape.log";


static HANDLE: OnceCell<Mutex<Handle>> = OnceCell::new();


fn stderr_is_tty() -> bool {
    std::io::stderr().is_terminal()
}


/// Names of the log targets, in the order they are attached.
fn target_names(isatty: bool, dir: Option<&Path>) -> Vec<String> {
    let mut ret = vec!["stderr".to_string()];
    if isatty {
        ret.push(format!("{:?}", GLOBAL_LOG));
    }
    if let Some(dir) = dir {
        ret.push(format!("{:?}", dir.join("run.log")));
    }
    ret
}


/// Human readable list of the targets `logger_init` installs.
pub fn logger_targets() -> String {
    target_names(stderr_is_tty(), None).join(" and ")
}


/// Logger configuration: stderr always, `./mixtape.log` for interactive runs, and `run.log`
/// inside `dir` if given.
fn gen_logger_config(dir: Option<&Path>) -> Result<Config> {
    let level = LevelFilter::Info;
    let isatty = stderr_is_tty();

    let stderr = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(ENCODE_STR)))
        .target(Target::Stderr)
        .build();

    let mut builder = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)));
    let mut root = Root::builder().appender("stderr");

    if isatty {
        let global_log = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(ENCODE_STR)))
            .build(GLOBAL_LOG)?;
        builder = builder.appender(Appender::builder().build("global_log", Box::new(global_log)));
        root = root.appender("global_log");
    }

    if let Some(dir) = dir {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(ENCODE_STR)))
            .build(dir.join("run.log"))?;
        builder = builder.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
    }

    Ok(builder.build(root.build(level))?)
}


fn handle() -> Result<&'static Mutex<Handle>> {
    HANDLE.get_or_try_init(|| {
        let config = gen_logger_config(None)?;
        Ok(Mutex::new(init_config(config)?))
    })
}


/// Installs the global logger. Calling it more than once is harmless.
pub fn logger_init() -> Result<()> {
    handle().map(|_| ())
}


/// Adds `run.log` in `dir` to the logger targets.
pub fn logger_redirect(dir: impl AsRef<Path>) -> Result<()> {
    let config = gen_logger_config(Some(dir.as_ref()))?;
    handle()?
        .lock()
        .map_err(|_| anyhow!("Logger handle is poisoned."))?
        .set_config(config);
    Ok(())
}
