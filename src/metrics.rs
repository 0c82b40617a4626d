use eg4_monitor_rs::model::RuntimeSnapshot;
use eg4_monitor_rs::sensor::SENSORS;
use prometheus::{Encoder, Gauge, GaugeVec, TextEncoder};

lazy_static! {
    static ref UP_GAUGE: Gauge = register_gauge!(opts!(
        "eg4_up",
        "1 if the last update from the EG4 portal succeeded, 0 otherwise",
    ))
    .unwrap();
    static ref CREDENTIALS_REJECTED_GAUGE: Gauge = register_gauge!(opts!(
        "eg4_credentials_rejected",
        "1 if the EG4 portal rejected the configured username or password",
    ))
    .unwrap();
    static ref SENSOR_GAUGE: GaugeVec = register_gauge_vec!(
        opts!("eg4_sensor", "EG4 inverter sensor reading"),
        &["serial", "sensor", "unit"],
    )
    .unwrap();
}

/// Feed every sensor that has a value in `snapshot` to the Prometheus registry.
pub fn publish(snapshot: &RuntimeSnapshot, serial: &str) {
    /* Optional readings that disappeared since the previous cycle must not linger */
    SENSOR_GAUGE.reset();

    for sensor in SENSORS {
        match sensor.read(snapshot) {
            Some(value) => SENSOR_GAUGE
                .with_label_values(&[serial, sensor.key, sensor.unit.symbol()])
                .set(value),
            None => log::trace!("sensor {} has no value", sensor.key),
        }
    }
    UP_GAUGE.set(1.0);
    CREDENTIALS_REJECTED_GAUGE.set(0.0);
}

/// Last update failed: every sensor becomes unavailable.
pub fn mark_unavailable(credentials_rejected: bool) {
    SENSOR_GAUGE.reset();
    UP_GAUGE.set(0.0);
    CREDENTIALS_REJECTED_GAUGE.set(if credentials_rejected { 1.0 } else { 0.0 });
}

/// Read metrics from Prometheus exporter registry.
pub async fn read() -> Result<String, eg4_monitor_rs::Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .or(Err(eg4_monitor_rs::Error::FormatError))?;
    String::from_utf8(buffer).or(Err(eg4_monitor_rs::Error::FormatError))
}
