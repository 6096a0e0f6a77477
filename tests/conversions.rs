use ina219_rs::registers::{
    current_ma, power_mw, shunt_voltage_mv, supply_voltage_v, BusVoltageReading, BusVoltageBits,
};

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-4 * b.abs().max(1.0)
}

#[test]
fn bus_voltage_12v() {
    // 12 V / 4 mV = 3000 counts -> 3000 << 3 = 0x5DC0
    let bus = BusVoltageReading::from_bits(0x5DC0);
    assert_eq!(bus.millivolts(), 12_000);
    assert!(close(bus.volts(), 12.0));
    assert!(!bus.overflow());
    assert!(!bus.conversion_ready());
}

#[test]
fn bus_voltage_flags_do_not_change_value() {
    let ovf = BusVoltageReading::from_bits(0x5DC0 | BusVoltageBits::OVF.bits());
    assert!(ovf.overflow());
    assert!(!ovf.conversion_ready());
    assert_eq!(ovf.millivolts(), 12_000);

    let cnvr = BusVoltageReading::from_bits(0x5DC0 | BusVoltageBits::CNVR.bits());
    assert!(cnvr.conversion_ready());
    assert!(!cnvr.overflow());
    assert_eq!(cnvr.millivolts(), 12_000);
}

#[test]
fn bus_voltage_sign_extension() {
    let negative = BusVoltageReading::from_bits(0xFFF8);
    assert_eq!(negative.counts(), -1);
    assert_eq!(negative.millivolts(), -4);
    assert!(negative.volts() < 0.0);

    // Bit 12 of the 13-bit field set, everything else clear: most negative value.
    let min = BusVoltageReading::from_bits(0x8000);
    assert_eq!(min.counts(), -4096);

    // Largest positive value, sign bit clear.
    let max = BusVoltageReading::from_bits(0x7FF8);
    assert_eq!(max.counts(), 4095);
    assert!(max.volts() >= 0.0);

    assert_eq!(BusVoltageReading::from_bits(0x0000).millivolts(), 0);
}

#[test]
fn shunt_voltage_is_signed_10uv() {
    assert!(close(shunt_voltage_mv(4000), 40.0));
    assert!(close(shunt_voltage_mv(-1000), -10.0));
    assert!(close(shunt_voltage_mv(i16::MIN), -327.68));
}

#[test]
fn current_and_power_scaling() {
    // 1000 counts x 100 uA/bit = 100 mA
    assert!(close(current_ma(1000, 1.0e-4), 100.0));
    assert!(close(current_ma(-1000, 1.0e-4), -100.0));
    // power register is unsigned: 0xFFFF stays positive
    assert!(close(power_mw(0xFFFF, 2.0e-3), 65_535.0 * 2.0));
    assert!(close(power_mw(500, 2.0e-3), 1000.0));
}

#[test]
fn supply_is_bus_plus_shunt() {
    assert!(close(supply_voltage_v(12.0, 5.0), 12.005));
    assert!(close(supply_voltage_v(5.0, -20.0), 4.98));
}

#[test]
fn bus_voltage_flag_positions() {
    assert_eq!(BusVoltageBits::OVF.bits(), 0x0001);
    assert_eq!(BusVoltageBits::CNVR.bits(), 0x0002);
    assert!(BusVoltageReading::from_bits(0x0001).overflow());
    assert!(!BusVoltageReading::from_bits(0x0002).overflow());
    assert!(BusVoltageReading::from_bits(0x0002).conversion_ready());
}
