//! Label canonicalization: one consistent spelling and spacing for stable
//! keys and display, without changing meaning. `canonicalize` is idempotent.

use regex::{Captures, Regex};

/// Fixed rewrite table: lowercase token → canonical spelling. Every
/// canonical spelling lowercases back to its own key, which is what makes
/// the rewrite idempotent.
const CANONICAL_SPELLINGS: &[(&str, &str)] = &[
    // Diesel fuel-system families
    ("tdi", "TDI"),
    ("cdi", "CDI"),
    ("crdi", "CRDi"),
    ("hdi", "HDi"),
    ("dci", "dCi"),
    ("jtd", "JTD"),
    ("tdci", "TDCi"),
    ("multijet", "MultiJet"),
    ("bluetec", "BlueTEC"),
    ("d-4d", "D-4D"),
    // Petrol fuel-system families
    ("tsi", "TSI"),
    ("tfsi", "TFSI"),
    ("fsi", "FSI"),
    ("gdi", "GDI"),
    ("mpi", "MPI"),
    ("vti", "VTi"),
    ("tce", "TCe"),
    ("t-jet", "T-Jet"),
    ("ecoboost", "EcoBoost"),
    ("vvt-i", "VVT-i"),
    // Electrified
    ("phev", "PHEV"),
    ("hev", "HEV"),
    ("bev", "BEV"),
    ("ev", "EV"),
    ("hybrid", "Hybrid"),
];

/// Canonicalize a free-text label: trim, collapse whitespace, normalize the
/// separator before a power suffix to `" - "`, rewrite known abbreviations.
/// Unrecognized tokens pass through unchanged, case preserved.
pub fn canonicalize(label: &str) -> String {
    let collapsed = label.split_whitespace().collect::<Vec<_>>().join(" ");

    let power = Regex::new(r"(?i)[\s-]*\b(\d{2,4})\s*(hp|ps|kw)\b").unwrap();
    let separated = power.replace_all(&collapsed, |caps: &Captures| {
        let unit = match caps[2].to_lowercase().as_str() {
            "kw" => "kW",
            "ps" => "ps",
            _ => "hp",
        };
        if caps.get(0).map(|m| m.start()) == Some(0) {
            // No preceding token; nothing to separate from.
            format!("{}{unit}", &caps[1])
        } else {
            format!(" - {}{unit}", &caps[1])
        }
    });

    separated
        .split(' ')
        .map(respell)
        .collect::<Vec<_>>()
        .join(" ")
}

fn respell(token: &str) -> &str {
    let lower = token.to_lowercase();
    CANONICAL_SPELLINGS
        .iter()
        .find(|(raw, _)| *raw == lower)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_collapses_whitespace() {
        assert_eq!(canonicalize("  1.6   TDI  -  105hp "), "1.6 TDI - 105hp");
    }

    #[test]
    fn normalizes_power_separator() {
        assert_eq!(canonicalize("1.6 TDI 105hp"), "1.6 TDI - 105hp");
        assert_eq!(canonicalize("1.6 TDI-105hp"), "1.6 TDI - 105hp");
        assert_eq!(canonicalize("1.6 tdi - 105 hp"), "1.6 TDI - 105hp");
    }

    #[test]
    fn normalizes_unit_casing() {
        assert_eq!(canonicalize("e-drive 150 KW"), "e-drive - 150kW");
        assert_eq!(canonicalize("2.0 TSI 190PS"), "2.0 TSI - 190ps");
    }

    #[test]
    fn respells_known_abbreviations() {
        assert_eq!(canonicalize("1.5 tdci 120hp"), "1.5 TDCi - 120hp");
        assert_eq!(canonicalize("1.4 t-jet 155hp"), "1.4 T-Jet - 155hp");
        assert_eq!(canonicalize("1.5 dci 110hp"), "1.5 dCi - 110hp");
    }

    #[test]
    fn unknown_tokens_pass_through() {
        assert_eq!(canonicalize("2.2 i-CTDi Executive"), "2.2 i-CTDi Executive");
    }

    #[test]
    fn hyphenated_family_names_survive() {
        // The "-" inside T-Jet must not be mistaken for a power separator.
        assert_eq!(canonicalize("1.4 T-Jet-155hp"), "1.4 T-Jet - 155hp");
    }

    #[test]
    fn bare_power_label_keeps_no_leading_separator() {
        assert_eq!(canonicalize("105hp"), "105hp");
    }

    #[test]
    fn idempotent_on_fixtures() {
        for label in [
            "1.6 TDI - 105hp",
            "  1.4  t-jet   157 HP ",
            "2.0 BlueTEC 4MATIC-194ps",
            "Electric 204 kw",
            "",
            "   ",
            "90hp",
        ] {
            let once = canonicalize(label);
            assert_eq!(canonicalize(&once), once, "not idempotent for {label:?}");
        }
    }
}
