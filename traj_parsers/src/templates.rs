//! Connectivity of standard residues, for files that carry no bonds of their own.

const BACKBONE: &[(&str, &str)] = &[("N", "CA"), ("CA", "C"), ("C", "O"), ("C", "OXT")];

const WATERS: &[&str] = &["HOH", "SOL", "WAT", "TIP3", "TIP4", "SPC"];


/// Residue name with protonation and disulfide variants folded onto the standard one.
fn canonical(name: &str) -> Option<&'static str> {
    Some(match name {
        "ALA" => "ALA",
        "ARG" => "ARG",
        "ASN" => "ASN",
        "ASP" | "ASH" => "ASP",
        "CYS" | "CYX" | "CYM" => "CYS",
        "GLN" => "GLN",
        "GLU" | "GLH" => "GLU",
        "GLY" => "GLY",
        "HIS" | "HID" | "HIE" | "HIP" | "HSD" | "HSE" | "HSP" => "HIS",
        "ILE" => "ILE",
        "LEU" => "LEU",
        "LYS" | "LYN" => "LYS",
        "MET" => "MET",
        "PHE" => "PHE",
        "PRO" => "PRO",
        "SER" => "SER",
        "THR" => "THR",
        "TRP" => "TRP",
        "TYR" => "TYR",
        "VAL" => "VAL",
        _ => return None,
    })
}


fn sidechain(canonical: &str) -> &'static [(&'static str, &'static str)] {
    match canonical {
        "ALA" => &[("CA", "CB")],
        "ARG" => &[("CA", "CB"), ("CB", "CG"), ("CG", "CD"), ("CD", "NE"), ("NE", "CZ"), ("CZ", "NH1"), ("CZ", "NH2")],
        "ASN" => &[("CA", "CB"), ("CB", "CG"), ("CG", "OD1"), ("CG", "ND2")],
        "ASP" => &[("CA", "CB"), ("CB", "CG"), ("CG", "OD1"), ("CG", "OD2")],
        "CYS" => &[("CA", "CB"), ("CB", "SG")],
        "GLN" => &[("CA", "CB"), ("CB", "CG"), ("CG", "CD"), ("CD", "OE1"), ("CD", "NE2")],
        "GLU" => &[("CA", "CB"), ("CB", "CG"), ("CG", "CD"), ("CD", "OE1"), ("CD", "OE2")],
        "HIS" => &[("CA", "CB"), ("CB", "CG"), ("CG", "ND1"), ("CG", "CD2"), ("ND1", "CE1"), ("CD2", "NE2"), ("CE1", "NE2")],
        "ILE" => &[("CA", "CB"), ("CB", "CG1"), ("CB", "CG2"), ("CG1", "CD1"), ("CG1", "CD")],
        "LEU" => &[("CA", "CB"), ("CB", "CG"), ("CG", "CD1"), ("CG", "CD2")],
        "LYS" => &[("CA", "CB"), ("CB", "CG"), ("CG", "CD"), ("CD", "CE"), ("CE", "NZ")],
        "MET" => &[("CA", "CB"), ("CB", "CG"), ("CG", "SD"), ("SD", "CE")],
        "PHE" => &[("CA", "CB"), ("CB", "CG"), ("CG", "CD1"), ("CG", "CD2"), ("CD1", "CE1"), ("CD2", "CE2"), ("CE1", "CZ"), ("CE2", "CZ")],
        "PRO" => &[("CA", "CB"), ("CB", "CG"), ("CG", "CD"), ("CD", "N")],
        "SER" => &[("CA", "CB"), ("CB", "OG")],
        "THR" => &[("CA", "CB"), ("CB", "OG1"), ("CB", "CG2")],
        "TRP" => &[("CA", "CB"), ("CB", "CG"), ("CG", "CD1"), ("CG", "CD2"), ("CD1", "NE1"), ("NE1", "CE2"), ("CD2", "CE2"),
                   ("CD2", "CE3"), ("CE2", "CZ2"), ("CE3", "CZ3"), ("CZ2", "CH2"), ("CZ3", "CH2")],
        "TYR" => &[("CA", "CB"), ("CB", "CG"), ("CG", "CD1"), ("CG", "CD2"), ("CD1", "CE1"), ("CD2", "CE2"), ("CE1", "CZ"), ("CE2", "CZ"),
                   ("CZ", "OH")],
        "VAL" => &[("CA", "CB"), ("CB", "CG1"), ("CB", "CG2")],
        _ => &[],
    }
}


pub fn is_amino_acid(name: &str) -> bool {
    canonical(name).is_some()
}


pub fn is_water(name: &str) -> bool {
    WATERS.contains(&name)
}


/// Heavy atom bonds of an amino acid by atom name, `None` for other residues.
pub fn heavy_atom_bonds(name: &str) -> Option<impl Iterator<Item = (&'static str, &'static str)>> {
    let name = canonical(name)?;
    Some(BACKBONE.iter().chain(sidechain(name).iter()).copied())
}


/// Heavy atom carrying the amino acid hydrogen `hydrogen`, chosen among `heavy` by the PDB naming
/// convention: `HB2` sits on `CB`, `HG21` on `CG2` and `HD1` on `ND1` rather than `CD2`.
pub fn hydrogen_parent<'a>(hydrogen: &str, heavy: &[&'a str]) -> Option<&'a str> {
    if !hydrogen.is_ascii() {
        return None;
    }

    // "1HB" is the old spelling of "HB1"
    let ndigits = hydrogen.chars().take_while(|c| c.is_ascii_digit()).count();
    let name = format!("{}{}", &hydrogen[ndigits ..], &hydrogen[.. ndigits]);
    let rest = name.strip_prefix('H')?;

    // H, HN, H1, H2, H3 and HT1.. are amide hydrogens
    if rest.is_empty() || rest == "N" || rest.starts_with('T') || rest.chars().all(|c| c.is_ascii_digit()) {
        return heavy.iter().copied().find(|&n| n == "N");
    }

    let remoteness = &rest[.. 1];
    let digits = &rest[1 ..];
    heavy.iter().copied()
        .filter(|n| n.is_ascii() && n.len() >= 2 && &n[1 .. 2] == remoteness)
        .filter(|n| digits.starts_with(&n[2 ..]))
        .max_by_key(|n| n.len())
}
