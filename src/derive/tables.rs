//! Static code tables for the Classic's status registers

use crate::error::EvalError;

/// Read-only code → value table
#[derive(Debug)]
pub struct LookupTable<T: 'static> {
    pub name: &'static str,
    entries: &'static [(i64, T)],
    /// Value returned for codes with no entry; `None` makes a miss an error
    fallback: Option<T>,
}

impl<T: Copy> LookupTable<T> {
    pub fn get(&self, code: i64) -> Result<T, EvalError> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, v)| *v)
            .or(self.fallback)
            .ok_or(EvalError::UnknownCode {
                table: self.name,
                code,
            })
    }

    pub fn codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }
}

/// Charge stage (MSB of 4120) in English
pub static STAGE_WORDS: LookupTable<&str> = LookupTable {
    name: "charge stage",
    entries: &[
        (0, "Sleep"),
        (3, "Absorb"),
        (4, "Bulk"),
        (5, "Float"),
        // "float mppt": failing to hold float voltage
        (6, "Float~"),
        (7, "EQ"),
        (10, "HyperVoc"),
        (18, "EQ~"),
    ],
    fallback: Some("Unknown"),
};

/// Charge stage remapped so that it increases through the charge cycle.
/// A miss is an error since an integer column has no "Unknown".
pub static STAGE_LINEAR: LookupTable<i64> = LookupTable {
    name: "linear charge stage",
    entries: &[
        (0, 2),
        (4, 3),
        (3, 4),
        (5, 5),
        (6, 5),
        (7, 6),
        (18, 6),
        (10, 7),
    ],
    fallback: None,
};

/// Controller state (LSB of 4120)
pub static STATE_WORDS: LookupTable<&str> = LookupTable {
    name: "state",
    entries: &[
        (0, "Resting"),
        (1, "Waking"),
        (2, "Waking"),
        (3, "Active"),
        (4, "Active"),
        (6, "Active"),
    ],
    fallback: Some("Unknown"),
};

/// Reason for resting (4275), full text
pub static RESTING_REASONS: LookupTable<&str> = LookupTable {
    name: "resting reason",
    entries: &[
        (1, "Anti-Click. Not enough power available (Wake Up)"),
        (2, "Insane Ibatt Measurement (Wake Up)"),
        (3, "Negative Current (load on PV input ?) (Wake Up)"),
        (4, "PV Input Voltage lower than Battery V (Vreg state)"),
        (5, "Too low of power out and Vbatt below set point for > 90 seconds"),
        (6, "FET temperature too high (Cover is on maybe ?)"),
        (7, "Ground Fault Detected"),
        (8, "Arc Fault Detected"),
        (
            9,
            "Too much negative current while operating (backfeed from battery out of PV input)",
        ),
        (10, "Battery is less than 8.0 Volts"),
        (
            11,
            "PV input is available but V is rising too slowly. Low Light or bad connection (Solar mode)",
        ),
        (
            12,
            "Voc has gone down from last Voc or low light. Re-check (Solar mode)",
        ),
        (
            13,
            "Voc has gone up from last Voc enough to be suspicious. Re-check (Solar mode)",
        ),
        (
            14,
            "PV input is available but V is rising too slowly. Low Light or bad connection (Solar mode)",
        ),
        (
            15,
            "Voc has gone down from last Voc or low light. Re-check (Solar mode)",
        ),
        (16, "Mppt MODE is OFF (Usually because user turned it off)"),
        (
            17,
            "PV input is higher than operation range (too high for 150V Classic)",
        ),
        (
            18,
            "PV input is higher than operation range (too high for 200V Classic)",
        ),
        (
            19,
            "PV input is higher than operation range (too high for 250V or 250KS)",
        ),
        (22, "Average Battery Voltage is too high above set point"),
        (
            25,
            "Battery Voltage too high of Overshoot (small battery or bad cable ?)",
        ),
        (
            26,
            "Mode changed while running OR Vabsorb raised more than 10.0 Volts at once OR Nominal\nVbatt changed by modbus command AND MpptMode was ON when changed",
        ),
        (
            27,
            "bridge center == 1023 (R132 might have been stuffed) This turns MPPT Mode to OFF",
        ),
        (28, "NOT Resting but RELAY is not engaged for some reason"),
        (
            29,
            "ON/OFF stays off because WIND GRAPH is illegal (current step is set for > 100 amps)",
        ),
        (
            30,
            "PkAmpsOverLimit... Software detected too high of PEAK output current",
        ),
        (
            31,
            "AD1CH.IbattMinus > 900 Peak negative battery current > 90.0 amps (Classic 250)",
        ),
        (
            32,
            "Aux 2 input commanded Classic off. for HI or LO (Aux2Function == 15 or 16)",
        ),
        (33, "OCP in a mode other than Solar or PV-Uset"),
        (
            34,
            "AD1CH.IbattMinus > 900 Peak negative battery current > 90.0 amps (Classic 150, 200)",
        ),
    ],
    fallback: None,
};

/// Reason for resting, short form; unlisted codes read "Unknown"
pub static RESTING_REASONS_SHORT: LookupTable<&str> = LookupTable {
    name: "short resting reason",
    entries: &[
        (1, "Low Light"),
        (2, "Battery Current Re-Calc"),
        (3, "Negative Current"),
        (4, "Input Voltage Lower than Battery Voltage"),
        (5, "Low Light"),
        (6, "FET Temp High"),
        (7, "Ground Fault"),
        (8, "Arc Fault"),
        (9, "Negative Current"),
        (10, "Very Low Battery Voltage"),
        (11, "Low Light"),
        (12, "Low Light"),
        (13, "Suspicious Voc jump"),
        (14, "Low Light"),
        (15, "Low Light"),
        (16, "MPPT Mode is OFF"),
        (17, "Input Voltage is too high"),
        (18, "Input Voltage is too high"),
        (19, "Input Voltage is too high"),
        (22, "Battery Voltage is too high"),
        (25, "Battery overshoot"),
        (26, "Abrupt Modbus Change"),
        (27, "Bridge Center High R132"),
        (28, "Relay Error"),
        (29, "Reload Wind Curve"),
    ],
    fallback: Some("Unknown"),
};
