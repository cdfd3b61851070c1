//! The canonical rule set: callsign patterns and the command table.
//!
//! Registration is a pure startup-time operation; both registries are
//! append-only while being built here and sealed behind `LazyLock` globals
//! afterwards. Handlers define the canonical code formats.

use aviation_helper_rs::aircraft::Aircraft;
use aviation_helper_rs::types::altitude::{Altitude, VerticalDirection};
use aviation_helper_rs::types::heading::{Heading, TurnDirection};

use crate::callsign::{CallsignPattern, CallsignRegistry, Candidate};
use crate::command::{CommandRegistry, CommandTemplate, Handler};
use crate::params::ParamValue;

fn ga(aircraft: &Aircraft) -> bool {
    aircraft.is_ga()
}

fn airline_only_scoring(candidate: &mut Candidate) -> Option<f64> {
    if candidate.airline_score < 0.7 {
        return None;
    }
    candidate.flight_score = 0.5;
    Some(0.6 + 0.4 * ((candidate.airline_score + candidate.flight_score) / 2.0))
}

fn flight_only_scoring(candidate: &mut Candidate) -> Option<f64> {
    candidate.airline_score = 0.5;
    Some(0.70)
}

pub fn standard_callsign_patterns() -> CallsignRegistry {
    let mut registry = CallsignRegistry::new();
    registry.register(
        CallsignPattern::parse("exact_phrase", "{skip:3}{exact_phrase}", 100)
            .fixed_confidence(1.0),
    );
    registry.register(
        CallsignPattern::parse("ga_suffix", "{skip:2}{suffix_phrase}", 95)
            .fixed_confidence(0.95)
            .condition(ga),
    );
    registry.register(
        CallsignPattern::parse("airline_flight", "{skip:2}{airline}{flight}", 80).min_score(1.0),
    );
    registry.register(
        CallsignPattern::parse("airline_only", "{skip:2}{airline}", 60)
            .scoring(airline_only_scoring)
            .require_unique(),
    );
    registry.register(
        CallsignPattern::parse("ga_november", "{skip:2}{ga_november}", 55).condition(ga),
    );
    registry.register(
        CallsignPattern::parse("flight_only", "{flight_only}", 50).scoring(flight_only_scoring),
    );
    registry
}

// --- command handlers ------------------------------------------------------

fn climb(_: &Aircraft, altitude: Option<&ParamValue>) -> Option<String> {
    Some(format!("C{}", altitude?.altitude()?))
}

fn descend(_: &Aircraft, altitude: Option<&ParamValue>) -> Option<String> {
    Some(format!("D{}", altitude?.altitude()?))
}

/// Bare "maintain" picks climb or descend from the current altitude.
fn maintain_altitude(aircraft: &Aircraft, altitude: Option<&ParamValue>) -> Option<String> {
    let feet = altitude?.altitude()?;
    let code = match Altitude::Feet(feet).direction_from(aircraft.altitude) {
        VerticalDirection::Climb => 'C',
        VerticalDirection::Descend => 'D',
    };
    Some(format!("{code}{feet}"))
}

fn turn_code(direction: TurnDirection, heading: Heading) -> String {
    match direction {
        TurnDirection::Left => format!("L{heading}"),
        TurnDirection::Right => format!("R{heading}"),
    }
}

fn turn_left_heading(_: &Aircraft, heading: Option<&ParamValue>) -> Option<String> {
    Some(turn_code(TurnDirection::Left, Heading::new(heading?.heading()?)))
}

fn turn_right_heading(_: &Aircraft, heading: Option<&ParamValue>) -> Option<String> {
    Some(turn_code(TurnDirection::Right, Heading::new(heading?.heading()?)))
}

/// Sequenced turns lose their relative direction; fly the heading instead.
fn fly_heading(_: &Aircraft, heading: Option<&ParamValue>) -> Option<String> {
    Some(format!("H{}", Heading::new(heading?.heading()?)))
}

fn turn_degrees_left(_: &Aircraft, degrees: Option<&ParamValue>) -> Option<String> {
    Some(format!("T{}L", degrees?.number()?))
}

fn turn_degrees_right(_: &Aircraft, degrees: Option<&ParamValue>) -> Option<String> {
    Some(format!("T{}R", degrees?.number()?))
}

fn present_heading(_: &Aircraft) -> Option<String> {
    Some("FPH".to_string())
}

fn direct_fix(_: &Aircraft, fix: Option<&ParamValue>) -> Option<String> {
    Some(format!("D{}", fix?.text()?))
}

fn cleared_approach(_: &Aircraft, approach: Option<&ParamValue>) -> Option<String> {
    Some(format!("C{}", approach?.text()?))
}

fn cleared_approach_lahso(_: &Aircraft, approach: Option<&ParamValue>) -> Option<String> {
    Some(format!("C{}/LAHSO", approach?.text()?))
}

fn expect_approach(_: &Aircraft, approach: Option<&ParamValue>) -> Option<String> {
    Some(format!("E{}", approach?.text()?))
}

fn intercept_localizer(_: &Aircraft) -> Option<String> {
    Some("IL".to_string())
}

fn climb_via_sid(_: &Aircraft, sid: Option<&ParamValue>) -> Option<String> {
    sid?.text()?;
    Some("CVS".to_string())
}

fn descend_via_star(_: &Aircraft, star: Option<&ParamValue>) -> Option<String> {
    star?.text()?;
    Some("DVS".to_string())
}

fn speed_with_until(
    _: &Aircraft,
    speed: Option<&ParamValue>,
    until: Option<&ParamValue>,
) -> Option<String> {
    let knots = speed?.speed()?;
    Some(match until.and_then(ParamValue::text) {
        Some(until) => format!("S{knots}/{until}"),
        None => format!("S{knots}"),
    })
}

fn squawk_code(_: &Aircraft, code: Option<&ParamValue>) -> Option<String> {
    Some(format!("SQ{}", code?.text()?))
}

fn squawk_vfr(_: &Aircraft) -> Option<String> {
    Some(String::new())
}

fn ident(_: &Aircraft) -> Option<String> {
    Some("ID".to_string())
}

fn contact_facility(_: &Aircraft, value: Option<&ParamValue>) -> Option<String> {
    match value? {
        ParamValue::Contact { facility, .. } => Some(facility.code().to_string()),
        _ => None,
    }
}

fn frequency_change(_: &Aircraft) -> Option<String> {
    Some("FC".to_string())
}

fn radar_contact(_: &Aircraft) -> Option<String> {
    Some(String::new())
}

fn go_around(_: &Aircraft) -> Option<String> {
    Some("GA".to_string())
}

fn cancel_approach(_: &Aircraft) -> Option<String> {
    Some("CAC".to_string())
}

fn atis_information(_: &Aircraft, letter: Option<&ParamValue>) -> Option<String> {
    Some(format!("ATIS/{}", letter?.letter()?.to_ascii_uppercase()))
}

fn hold_at(_: &Aircraft, fix: Option<&ParamValue>) -> Option<String> {
    Some(format!("HOLD/{}", fix?.text()?))
}

fn traffic_advisory(_: &Aircraft, _: Option<&ParamValue>) -> Option<String> {
    Some(String::new())
}

pub fn standard_command_templates() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    let mut add = |template: CommandTemplate| registry.register(template);

    add(CommandTemplate::new(
        "cleared_direct",
        "cleared direct {fix}",
        95,
        Handler::Unary(direct_fix),
    ));
    add(CommandTemplate::new(
        "proceed_direct",
        "proceed direct {fix}",
        94,
        Handler::Unary(direct_fix),
    ));
    add(CommandTemplate::new(
        "direct",
        "direct {fix}",
        93,
        Handler::Unary(direct_fix),
    ));
    add(
        CommandTemplate::new(
            "cleared_approach_lahso",
            "cleared {approach_lahso} hold short",
            92,
            Handler::Unary(cleared_approach_lahso),
        )
        .say_again("APPROACH"),
    );
    add(
        CommandTemplate::new(
            "cleared_approach",
            "cleared {approach}",
            90,
            Handler::Unary(cleared_approach),
        )
        .say_again("APPROACH"),
    );
    add(
        CommandTemplate::new(
            "expect_approach",
            "expect {approach}",
            88,
            Handler::Unary(expect_approach),
        )
        .say_again("APPROACH"),
    );
    add(CommandTemplate::new(
        "intercept_localizer",
        "intercept localizer|ils",
        86,
        Handler::Nullary(intercept_localizer),
    ));
    add(
        CommandTemplate::new(
            "climb_via_sid",
            "climb via {sid} [departure]",
            85,
            Handler::Unary(climb_via_sid),
        )
        .say_again("SID"),
    );
    add(
        CommandTemplate::new(
            "descend_via_star",
            "descend via {star} [arrival]",
            85,
            Handler::Unary(descend_via_star),
        )
        .say_again("STAR"),
    );
    add(
        CommandTemplate::new(
            "turn_left_heading",
            "turn left heading {heading}",
            84,
            Handler::Unary(turn_left_heading),
        )
        .then(Handler::Unary(fly_heading)),
    );
    add(
        CommandTemplate::new(
            "turn_right_heading",
            "turn right heading {heading}",
            84,
            Handler::Unary(turn_right_heading),
        )
        .then(Handler::Unary(fly_heading)),
    );
    add(CommandTemplate::new(
        "turn_heading",
        "turn heading {heading}",
        83,
        Handler::Unary(fly_heading),
    ));
    add(CommandTemplate::new(
        "fly_heading",
        "fly heading {heading}",
        83,
        Handler::Unary(fly_heading),
    ));
    add(CommandTemplate::new(
        "turn_left_degrees",
        "turn left {degrees} degrees",
        82,
        Handler::Unary(turn_degrees_left),
    ));
    add(CommandTemplate::new(
        "turn_right_degrees",
        "turn right {degrees} degrees",
        82,
        Handler::Unary(turn_degrees_right),
    ));
    add(CommandTemplate::new(
        "turn_degrees_left",
        "turn {degrees} degrees left",
        82,
        Handler::Unary(turn_degrees_left),
    ));
    add(CommandTemplate::new(
        "turn_degrees_right",
        "turn {degrees} degrees right",
        82,
        Handler::Unary(turn_degrees_right),
    ));
    add(
        CommandTemplate::new(
            "turn_left",
            "turn left {heading}",
            81,
            Handler::Unary(turn_left_heading),
        )
        .then(Handler::Unary(fly_heading)),
    );
    add(
        CommandTemplate::new(
            "turn_right",
            "turn right {heading}",
            81,
            Handler::Unary(turn_right_heading),
        )
        .then(Handler::Unary(fly_heading)),
    );
    add(CommandTemplate::new(
        "present_heading",
        "fly|maintain present heading",
        80,
        Handler::Nullary(present_heading),
    ));
    add(CommandTemplate::new(
        "climb",
        "climb [maintain] {altitude}",
        79,
        Handler::Unary(climb),
    ));
    add(CommandTemplate::new(
        "descend",
        "descend [maintain] {altitude}",
        79,
        Handler::Unary(descend),
    ));
    add(CommandTemplate::new(
        "maintain_speed",
        "maintain {speed} knots [{speed_until}]",
        78,
        Handler::Binary(speed_with_until),
    ));
    add(CommandTemplate::new(
        "maintain_altitude",
        "maintain {altitude}",
        77,
        Handler::Unary(maintain_altitude),
    ));
    add(CommandTemplate::new(
        "change_speed",
        "reduce|increase speed {speed} [knots] [{speed_until}]",
        76,
        Handler::Binary(speed_with_until),
    ));
    add(CommandTemplate::new(
        "change_speed_short",
        "reduce|increase {speed} [knots] [{speed_until}]",
        75,
        Handler::Binary(speed_with_until),
    ));
    add(CommandTemplate::new(
        "squawk_vfr",
        "squawk vfr",
        74,
        Handler::Nullary(squawk_vfr),
    ));
    add(CommandTemplate::new(
        "squawk",
        "squawk {squawk}",
        73,
        Handler::Unary(squawk_code),
    ));
    add(CommandTemplate::new(
        "ident",
        "ident",
        72,
        Handler::Nullary(ident),
    ));
    add(CommandTemplate::new(
        "contact",
        "contact {contact_frequency}",
        71,
        Handler::Unary(contact_facility),
    ));
    add(CommandTemplate::new(
        "frequency_change",
        "frequency change approved",
        70,
        Handler::Nullary(frequency_change),
    ));
    add(CommandTemplate::new(
        "radar_contact",
        "radar contact",
        69,
        Handler::Nullary(radar_contact),
    ));
    add(CommandTemplate::new(
        "go_around",
        "go around",
        68,
        Handler::Nullary(go_around),
    ));
    add(CommandTemplate::new(
        "cancel_approach",
        "cancel approach clearance",
        67,
        Handler::Nullary(cancel_approach),
    ));
    add(CommandTemplate::new(
        "hold",
        "hold {hold}",
        66,
        Handler::Unary(hold_at),
    ));
    add(CommandTemplate::new(
        "traffic",
        "traffic {traffic}",
        65,
        Handler::Unary(traffic_advisory),
    ));
    add(CommandTemplate::new(
        "atis",
        "information|atis {atis_letter}",
        64,
        Handler::Unary(atis_information),
    ));
    add(CommandTemplate::new(
        "standalone_altitude",
        "{standalone_altitude}",
        40,
        Handler::Unary(maintain_altitude),
    ));
    registry
}
