//! Per-subcircuit solve loop and result extraction.

use std::collections::HashMap;

use crate::circuit::{
    partition, resolve_effective_nodes, Computed, Element, ElementKind, MeterMode, Wire,
};
use crate::solver::{
    classify, gauss, Classification, MnaSystem, NodeLayout, SourceKind,
    AMMETER_SHUNT_RESISTANCE, LED_ON_RESISTANCE, LIGHTBULB_RESISTANCE, MAX_LED_ITERATIONS,
    MIN_LEG_RESISTANCE, MIN_RESISTANCE, OHMMETER_TEST_VOLTAGE, RAIL_VOLTAGE,
    VOLTMETER_RESISTANCE,
};

/// Solve the DC steady state of the whole board.
///
/// Every input element comes back exactly once with its `computed` record
/// filled in. Elements outside any solvable subcircuit, and every element
/// of a subcircuit whose system turned out singular, carry all-zero
/// readings; an ohmmeter sharing a subcircuit with a powered element
/// carries a `NaN` measurement. This function never fails and holds no
/// state between calls.
pub fn solve(elements: &[Element], wires: &[Wire]) -> Vec<Element> {
    let parts = partition(elements, wires);
    log::debug!(
        "solving {} subcircuit(s) over {} element(s), {} wire(s)",
        parts.len(),
        elements.len(),
        wires.len()
    );

    let mut out = elements.to_vec();
    for el in &mut out {
        el.computed = Computed::ZERO;
    }

    for part in &parts {
        let els: Vec<&Element> = part.element_indices.iter().map(|&i| &elements[i]).collect();
        let wrs: Vec<&Wire> = part.wire_indices.iter().map(|&i| &wires[i]).collect();
        let results = solve_subcircuit(&els, &wrs);
        for (local, computed) in results.into_iter().enumerate() {
            out[part.element_indices[local]].computed = computed;
        }
    }

    out
}

fn solve_subcircuit(elements: &[&Element], wires: &[&Wire]) -> Vec<Computed> {
    let eff = resolve_effective_nodes(elements, wires);
    if eff.is_empty() {
        // Nothing resolvable (decorations only); no solve needed.
        return vec![Computed::ZERO; elements.len()];
    }

    let layout = NodeLayout::new(&eff);
    let cls = classify(elements, &layout);

    let led_indices: Vec<usize> = elements
        .iter()
        .enumerate()
        .filter(|(_, el)| el.kind == ElementKind::Led)
        .map(|(i, _)| i)
        .collect();
    // Every LED starts off; the fixed point is reached from below.
    let mut led_on: HashMap<usize, bool> = led_indices.iter().map(|&i| (i, false)).collect();

    let mut x: Vec<f64> = Vec::new();
    for iter in 1..=MAX_LED_ITERATIONS {
        let sys = assemble(elements, &layout, &cls, &led_on);
        let (mut a, mut z) = sys.concat();
        match gauss::solve_dense(&mut a, &mut z, sys.size()) {
            Ok(solution) => x = solution,
            Err(err) => {
                log::debug!("subcircuit of {} element(s) unsolvable: {err}", elements.len());
                return failed_results(elements, &cls);
            }
        }

        let next: HashMap<usize, bool> = led_indices
            .iter()
            .map(|&i| {
                let el = elements[i];
                let on = differential(el, &layout, &x) >= el.led_color().forward_voltage();
                (i, on)
            })
            .collect();

        if next == led_on {
            log::trace!("LED states converged after {iter} iteration(s)");
            break;
        }
        if iter == MAX_LED_ITERATIONS {
            // Accept the last solution with the flags it was stamped under.
            log::debug!("LED iteration cap reached without convergence");
            break;
        }
        led_on = next;
    }

    extract(elements, &layout, &cls, &led_on, &x)
}

/// Stamp one linear system for the current LED on/off flags.
fn assemble(
    elements: &[&Element],
    layout: &NodeLayout,
    cls: &Classification,
    led_on: &HashMap<usize, bool>,
) -> MnaSystem {
    let mut sys = MnaSystem::new(layout.n, cls.aux_count());

    for (idx, el) in elements.iter().enumerate() {
        match el.kind {
            ElementKind::Resistor => {
                if let Some((n1, n2)) = pair_indices(el, layout) {
                    sys.stamp_conductance(n1, n2, 1.0 / el.resistance().max(MIN_RESISTANCE));
                }
            }

            ElementKind::Lightbulb => {
                if let Some((n1, n2)) = pair_indices(el, layout) {
                    sys.stamp_conductance(n1, n2, 1.0 / LIGHTBULB_RESISTANCE);
                }
            }

            ElementKind::Led => {
                // An off LED is electrically invisible.
                if led_on.get(&idx).copied().unwrap_or(false) {
                    if let Some((anode, cathode)) = pair_indices(el, layout) {
                        sys.stamp_conductance(anode, cathode, 1.0 / LED_ON_RESISTANCE);
                    }
                }
            }

            ElementKind::Potentiometer => {
                let Some((a, w, b)) = el.wiper_split() else {
                    continue;
                };
                let (Some(na), Some(nw), Some(nb)) = (
                    layout.index(&a.id),
                    layout.index(&w.id),
                    layout.index(&b.id),
                ) else {
                    continue;
                };
                let (r_aw, r_wb) = pot_legs(el);
                sys.stamp_conductance(na, nw, 1.0 / r_aw);
                sys.stamp_conductance(nw, nb, 1.0 / r_wb);
            }

            ElementKind::Multimeter => {
                // Only voltage mode is a pure conductance; the other modes
                // are classified as sources.
                if el.meter_mode() == MeterMode::Voltage {
                    if let Some((n1, n2)) = pair_indices(el, layout) {
                        sys.stamp_conductance(n1, n2, 1.0 / VOLTMETER_RESISTANCE);
                    }
                }
            }

            _ => {}
        }
    }

    for s in &cls.sources {
        sys.stamp_source(s.n_pos, s.n_neg, s.aux, s.emf, s.r_series);
    }

    sys
}

/// Matrix indices of a two-terminal element, or `None` when either
/// terminal is missing from the subcircuit.
fn pair_indices(el: &Element, layout: &NodeLayout) -> Option<(Option<usize>, Option<usize>)> {
    let (a, b) = el.oriented_pair()?;
    Some((layout.index(&a.id)?, layout.index(&b.id)?))
}

/// Potentiometer leg resistances (A-wiper, wiper-B) after the ratio split.
fn pot_legs(el: &Element) -> (f64, f64) {
    let total = el.resistance();
    let ratio = el.ratio();
    (
        (total * (1.0 - ratio)).max(MIN_LEG_RESISTANCE),
        (total * ratio).max(MIN_LEG_RESISTANCE),
    )
}

/// Voltage of a terminal's effective node; ground and absent terminals
/// read as zero.
fn node_voltage(layout: &NodeLayout, x: &[f64], node_id: &str) -> f64 {
    match layout.index(node_id) {
        Some(Some(i)) => x[i],
        _ => 0.0,
    }
}

/// Positive-to-negative voltage across a two-terminal element. For an LED
/// this is the anode-to-cathode forward voltage.
fn differential(el: &Element, layout: &NodeLayout, x: &[f64]) -> f64 {
    let Some((pos, neg)) = el.oriented_pair() else {
        return 0.0;
    };
    node_voltage(layout, x, &pos.id) - node_voltage(layout, x, &neg.id)
}

/// Readings for an unsolvable subcircuit: all zeros, except ohmmeters
/// facing a powered circuit still flag their measurement as an error.
fn failed_results(elements: &[&Element], cls: &Classification) -> Vec<Computed> {
    elements
        .iter()
        .map(|el| {
            let mut c = Computed::ZERO;
            if el.kind == ElementKind::Multimeter
                && el.meter_mode() == MeterMode::Resistance
                && cls.powered
            {
                c.measurement = f64::NAN;
            }
            c
        })
        .collect()
}

/// Map the solution vector back onto per-element readings.
fn extract(
    elements: &[&Element],
    layout: &NodeLayout,
    cls: &Classification,
    led_on: &HashMap<usize, bool>,
    x: &[f64],
) -> Vec<Computed> {
    elements
        .iter()
        .enumerate()
        .map(|(idx, el)| extract_one(idx, el, layout, cls, led_on, x))
        .collect()
}

fn extract_one(
    idx: usize,
    el: &Element,
    layout: &NodeLayout,
    cls: &Classification,
    led_on: &HashMap<usize, bool>,
    x: &[f64],
) -> Computed {
    let mut c = Computed::ZERO;

    match el.kind {
        ElementKind::Resistor => {
            c.voltage = differential(el, layout, x);
            c.current = c.voltage / el.resistance().max(MIN_RESISTANCE);
            c.power = c.voltage * c.current;
        }

        ElementKind::Lightbulb => {
            c.voltage = differential(el, layout, x);
            c.current = c.voltage / LIGHTBULB_RESISTANCE;
            c.power = c.voltage * c.current;
        }

        ElementKind::Led => {
            let forward = differential(el, layout, x);
            if led_on.get(&idx).copied().unwrap_or(false) {
                c.voltage = forward;
                c.current = forward / LED_ON_RESISTANCE;
                c.power = c.voltage * c.current;
            } else {
                // Probe reading only; an off LED carries no current.
                c.voltage = forward;
            }
        }

        ElementKind::Potentiometer => {
            if let Some((a, w, b)) = el.wiper_split() {
                let va = node_voltage(layout, x, &a.id);
                let vw = node_voltage(layout, x, &w.id);
                let vb = node_voltage(layout, x, &b.id);
                let (r_aw, _) = pot_legs(el);
                c.voltage = va - vb;
                c.current = (va - vw) / r_aw;
                c.power = c.voltage * c.current;
            }
        }

        ElementKind::Battery | ElementKind::PowerSupply => {
            if let Some(s) = cls.sources_of(idx).next() {
                // The stamped unknown is the current into the positive
                // terminal; a sourcing element reads positive.
                c.current = -x[layout.n + s.aux];
                c.voltage = el.source_voltage();
                c.power = c.voltage * c.current;
            }
        }

        ElementKind::Microbit | ElementKind::MicrobitBreakout => {
            if let Some(s) = cls
                .sources_of(idx)
                .find(|s| s.kind == SourceKind::Rail)
            {
                c.current = -x[layout.n + s.aux];
                c.voltage = RAIL_VOLTAGE;
                c.power = c.voltage * c.current;
            }
        }

        ElementKind::Multimeter => {
            let diff = differential(el, layout, x);
            match el.meter_mode() {
                MeterMode::Voltage => {
                    c.voltage = diff;
                    c.current = diff / VOLTMETER_RESISTANCE;
                    c.power = c.voltage * c.current;
                    c.measurement = diff;
                }
                MeterMode::Current => {
                    c.voltage = diff;
                    c.current = diff / AMMETER_SHUNT_RESISTANCE;
                    c.power = c.voltage * c.current;
                    c.measurement = c.current;
                }
                MeterMode::Resistance => {
                    c.voltage = diff;
                    if cls.powered {
                        // Ohmmeters cannot measure a live circuit.
                        c.measurement = f64::NAN;
                    } else if let Some(s) = cls.sources_of(idx).next() {
                        let j = x[layout.n + s.aux];
                        c.current = -j;
                        c.measurement = OHMMETER_TEST_VOLTAGE / j.abs();
                        c.power = c.voltage * c.current;
                    }
                }
            }
        }

        ElementKind::Decoration => {}
    }

    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    use crate::circuit::test_fixtures::{
        battery, breakout, led, lightbulb, microbit, multimeter, potentiometer, resistor, wire,
    };
    use crate::circuit::LedColor;

    fn find<'a>(out: &'a [Element], id: &str) -> &'a Element {
        out.iter().find(|el| el.id == id).unwrap()
    }

    #[test]
    fn test_series_divider() {
        let elements = vec![
            battery("b1", 9.0, 1.45),
            resistor("r1", 5.0),
            resistor("r2", 10.0),
        ];
        let wires = vec![
            wire("b1+", "r1.0"),
            wire("r1.1", "r2.0"),
            wire("r2.1", "b1-"),
        ];
        let out = solve(&elements, &wires);

        let total = 9.0 / (1.45 + 5.0 + 10.0);
        assert_relative_eq!(find(&out, "b1").computed.current, total, epsilon = 1e-9);
        assert_relative_eq!(
            find(&out, "r2").computed.current.abs(),
            total,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            find(&out, "r2").computed.voltage.abs(),
            total * 10.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            find(&out, "r1").computed.power,
            total * total * 5.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_parallel_resistors_split_evenly() {
        let elements = vec![
            battery("b1", 9.0, 0.0),
            resistor("r1", 10.0),
            resistor("r2", 10.0),
        ];
        let wires = vec![
            wire("b1+", "r1.0"),
            wire("b1+", "r2.0"),
            wire("r1.1", "b1-"),
            wire("r2.1", "b1-"),
        ];
        let out = solve(&elements, &wires);

        let per_branch = 9.0 / 10.0;
        assert_relative_eq!(
            find(&out, "b1").computed.current,
            2.0 * per_branch,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            find(&out, "r1").computed.current.abs(),
            per_branch,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            find(&out, "r2").computed.current.abs(),
            per_branch,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_lightbulb_uses_fixed_resistance() {
        let elements = vec![battery("b1", 9.0, 0.0), lightbulb("l1")];
        let wires = vec![wire("b1+", "l1.0"), wire("l1.1", "b1-")];
        let out = solve(&elements, &wires);

        let i = 9.0 / LIGHTBULB_RESISTANCE;
        assert_relative_eq!(find(&out, "l1").computed.current.abs(), i, epsilon = 1e-9);
        assert_relative_eq!(find(&out, "l1").computed.power, 9.0 * i, epsilon = 1e-9);
    }

    #[test]
    fn test_isolated_element_reads_zero() {
        let elements = vec![
            battery("b1", 9.0, 0.0),
            resistor("r1", 10.0),
            resistor("lonely", 10.0),
        ];
        let wires = vec![wire("b1+", "r1.0"), wire("r1.1", "b1-")];
        let out = solve(&elements, &wires);

        assert_eq!(find(&out, "lonely").computed, Computed::ZERO);
        assert!(find(&out, "r1").computed.current.abs() > 0.0);
    }

    #[test]
    fn test_led_threshold_is_inclusive() {
        let elements = vec![battery("b1", 1.8, 0.0), led("d1", LedColor::Red)];
        let wires = vec![wire("b1+", "d1.a"), wire("d1.c", "b1-")];
        let out = solve(&elements, &wires);

        let d = find(&out, "d1");
        assert_relative_eq!(d.computed.voltage, 1.8, epsilon = 1e-9);
        assert_relative_eq!(d.computed.current, 1.8 / LED_ON_RESISTANCE, epsilon = 1e-9);
    }

    #[test]
    fn test_led_below_threshold_stays_dark() {
        let elements = vec![battery("b1", 1.75, 0.0), led("d1", LedColor::Red)];
        let wires = vec![wire("b1+", "d1.a"), wire("d1.c", "b1-")];
        let out = solve(&elements, &wires);

        let d = find(&out, "d1");
        assert_eq!(d.computed.current, 0.0);
        assert_eq!(d.computed.power, 0.0);
        // Probe voltage across the open LED is still visible.
        assert_relative_eq!(d.computed.voltage, 1.75, epsilon = 1e-9);
    }

    #[test]
    fn test_led_loaded_by_series_resistor() {
        // 9 V across 100 ohm + red LED: on-state drop is
        // 9 * 100/200 = 4.5 V, well above threshold.
        let elements = vec![
            battery("b1", 9.0, 0.0),
            resistor("r1", 100.0),
            led("d1", LedColor::Red),
        ];
        let wires = vec![
            wire("b1+", "r1.0"),
            wire("r1.1", "d1.a"),
            wire("d1.c", "b1-"),
        ];
        let out = solve(&elements, &wires);

        let d = find(&out, "d1");
        assert_relative_eq!(d.computed.voltage, 4.5, epsilon = 1e-9);
        assert_relative_eq!(d.computed.current, 0.045, epsilon = 1e-9);
    }

    #[test]
    fn test_voltmeter_is_noninvasive() {
        let bare = vec![battery("b1", 9.0, 1.0), resistor("r1", 100.0)];
        let bare_wires = vec![wire("b1+", "r1.0"), wire("r1.1", "b1-")];
        let out = solve(&bare, &bare_wires);
        let i_bare = find(&out, "r1").computed.current.abs();

        let probed = vec![
            battery("b1", 9.0, 1.0),
            resistor("r1", 100.0),
            multimeter("m1", MeterMode::Voltage),
        ];
        let probed_wires = vec![
            wire("b1+", "r1.0"),
            wire("r1.1", "b1-"),
            wire("m1+", "r1.0"),
            wire("m1-", "r1.1"),
        ];
        let out = solve(&probed, &probed_wires);
        let i_probed = find(&out, "r1").computed.current.abs();
        let m = find(&out, "m1");

        assert!(((i_bare - i_probed) / i_bare).abs() < 1e-4);
        assert_relative_eq!(
            m.computed.measurement,
            find(&out, "r1").computed.voltage,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_ammeter_measures_loop_current() {
        let elements = vec![
            battery("b1", 9.0, 0.0),
            multimeter("m1", MeterMode::Current),
            resistor("r1", 10.0),
        ];
        let wires = vec![
            wire("b1+", "m1+"),
            wire("m1-", "r1.0"),
            wire("r1.1", "b1-"),
        ];
        let out = solve(&elements, &wires);

        let expected = 9.0 / (10.0 + AMMETER_SHUNT_RESISTANCE);
        assert_relative_eq!(
            find(&out, "m1").computed.measurement,
            expected,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_ohmmeter_reads_resistance() {
        let elements = vec![multimeter("m1", MeterMode::Resistance), resistor("r1", 47.0)];
        let wires = vec![wire("m1+", "r1.0"), wire("r1.1", "m1-")];
        let out = solve(&elements, &wires);

        assert_relative_eq!(
            find(&out, "m1").computed.measurement,
            47.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_ohmmeter_on_powered_circuit_errors() {
        let elements = vec![
            battery("b1", 9.0, 0.0),
            resistor("r1", 10.0),
            multimeter("m1", MeterMode::Resistance),
        ];
        let wires = vec![
            wire("b1+", "r1.0"),
            wire("r1.1", "b1-"),
            wire("m1+", "r1.0"),
            wire("m1-", "r1.1"),
        ];
        let out = solve(&elements, &wires);

        assert!(find(&out, "m1").computed.measurement.is_nan());
        // The rest of the loop still solves.
        assert_relative_eq!(
            find(&out, "r1").computed.current.abs(),
            0.9,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_potentiometer_wiper_sweep_is_monotonic() {
        let mut last = -1.0;
        for ratio in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let elements = vec![
                battery("b1", 9.0, 0.0),
                potentiometer("p1", 100.0, ratio),
                multimeter("m1", MeterMode::Voltage),
            ];
            let wires = vec![
                wire("b1+", "p1.a"),
                wire("p1.b", "b1-"),
                wire("m1+", "p1.w"),
                wire("m1-", "p1.b"),
            ];
            let out = solve(&elements, &wires);
            let vw = find(&out, "m1").computed.measurement;
            assert!(vw > last, "wiper voltage must rise with ratio");
            assert!((-0.1..=9.1).contains(&vw));
            last = vw;
        }
    }

    #[test]
    fn test_high_pin_lights_led() {
        let elements = vec![microbit("mb", &[("P0", 1)]), led("d1", LedColor::Red)];
        let wires = vec![wire("mb.P0", "d1.a"), wire("d1.c", "mb.GND")];
        let out = solve(&elements, &wires);

        // 3.3 V through two 25 ohm ties into a 100 ohm on-state LED.
        let expected = RAIL_VOLTAGE / (2.0 * 25.0 + LED_ON_RESISTANCE);
        let d = find(&out, "d1");
        assert_relative_eq!(d.computed.current, expected, epsilon = 1e-9);
        assert_relative_eq!(
            find(&out, "mb").computed.current,
            expected,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_low_pin_leaves_led_dark() {
        let elements = vec![microbit("mb", &[("P0", 0)]), led("d1", LedColor::Red)];
        let wires = vec![wire("mb.P0", "d1.a"), wire("d1.c", "mb.GND")];
        let out = solve(&elements, &wires);

        assert_eq!(find(&out, "d1").computed.current, 0.0);
    }

    #[test]
    fn test_breakout_ground_pads_share_a_rail() {
        // The loop closes only through the board's internal ground rail.
        let elements = vec![
            breakout("bo", &[]),
            battery("b1", 9.0, 0.0),
            resistor("r1", 10.0),
        ];
        let wires = vec![
            wire("b1+", "r1.0"),
            wire("r1.1", "bo.GND.0"),
            wire("bo.GND.1", "b1-"),
        ];
        let out = solve(&elements, &wires);

        assert_relative_eq!(
            find(&out, "r1").computed.current.abs(),
            0.9,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_shorted_ideal_source_zeroes_subcircuit() {
        // A zero-resistance loop across an ideal source has no finite
        // solution; the subcircuit reports nothing instead of crashing.
        let elements = vec![battery("b1", 9.0, 0.0), battery("b2", 3.0, 0.0)];
        let wires = vec![wire("b1+", "b2+"), wire("b2-", "b1-")];
        let out = solve(&elements, &wires);

        assert_eq!(find(&out, "b1").computed, Computed::ZERO);
        assert_eq!(find(&out, "b2").computed, Computed::ZERO);
    }

    #[test]
    fn test_solve_is_idempotent() {
        let elements = vec![
            battery("b1", 9.0, 1.45),
            resistor("r1", 5.0),
            led("d1", LedColor::Green),
        ];
        let wires = vec![
            wire("b1+", "r1.0"),
            wire("r1.1", "d1.a"),
            wire("d1.c", "b1-"),
        ];
        let a = solve(&elements, &wires);
        let b = solve(&elements, &wires);

        for (ea, eb) in a.iter().zip(&b) {
            assert_eq!(ea.id, eb.id);
            assert_eq!(ea.computed, eb.computed);
        }
    }

    #[test]
    fn test_every_element_appears_once() {
        let elements = vec![
            battery("b1", 9.0, 0.0),
            resistor("r1", 10.0),
            resistor("floating", 10.0),
        ];
        let wires = vec![wire("b1+", "r1.0"), wire("r1.1", "b1-")];
        let out = solve(&elements, &wires);

        assert_eq!(out.len(), elements.len());
        for el in &elements {
            assert_eq!(out.iter().filter(|o| o.id == el.id).count(), 1);
        }
    }
}
