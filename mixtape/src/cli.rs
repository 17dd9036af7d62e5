use std::sync::OnceLock;

use clap::{
    Parser,
    builder::styling::{
        AnsiColor,
        Effects,
        Styles,
    },
};

use shared::{log, Result};
use crate::version::Version;
use crate::logging::{logger_init, logger_targets};
use crate::featurize::{
    AtomPairsCommand,
    ContactCommand,
    DihedralCommand,
    DRIDCommand,
    FeaturizeCommand,
    SuperposeCommand,
};


pub fn get_style() -> Styles {
    static INSTANCE: OnceLock<Styles> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        Styles::styled()
            .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
            .usage(AnsiColor::Green.on_default()   | Effects::BOLD)
            .literal(AnsiColor::Green.on_default() | Effects::BOLD)
            .placeholder(AnsiColor::BrightBlue.on_default())
            .error(AnsiColor::BrightRed.on_default())
            .valid(AnsiColor::BrightYellow.on_default())
    }).to_owned()
}


pub trait OptProcess : Parser {
    fn process(&self) -> Result<()>;
}


#[derive(Debug, Parser)]
#[command(name = "mixtape",
          about = Version::new().to_string(),
          long_about = format!("{:#}", Version::new()),
          version,
          styles = get_style())]
enum Opt {
    #[command(alias = "DihedralFeaturizer")]
    Dihedral(DihedralCommand),

    #[command(alias = "AtomPairsFeaturizer")]
    AtomPairs(AtomPairsCommand),

    #[command(alias = "SuperposeFeaturizer")]
    Superpose(SuperposeCommand),

    #[command(alias = "DRIDFeaturizer")]
    Drid(DRIDCommand),

    #[command(alias = "ContactFeaturizer")]
    Contact(ContactCommand),

    Featurize(FeaturizeCommand),
}


impl OptProcess for Opt {
    fn process(&self) -> Result<()> {
        use Opt::*;

        logger_init()?;
        log::info!("Global logger initialized with targets being {}", logger_targets());

        match self {
            Dihedral(cmd)  => cmd.process(),
            AtomPairs(cmd) => cmd.process(),
            Superpose(cmd) => cmd.process(),
            Drid(cmd)      => cmd.process(),
            Contact(cmd)   => cmd.process(),
            Featurize(cmd) => cmd.process(),
        }
    }
}


pub fn run() -> Result<()> {
    Opt::parse().process()
}
