//! Builders for synthetic containers used by unit tests

/// One `InputAxis` record to serialize
#[derive(Debug, Clone)]
pub struct AxisRecord {
    /// `m_Name`
    pub name: String,
    /// `negativeButton`
    pub negative_button: String,
    /// `positiveButton`
    pub positive_button: String,
    /// `gravity`
    pub gravity: f32,
    /// `dead`
    pub dead: f32,
    /// `sensitivity`
    pub sensitivity: f32,
    /// `snap`
    pub snap: bool,
    /// `invert`
    pub invert: bool,
    /// `type`
    pub kind: i32,
    /// `axis`
    pub axis: i32,
    /// `joyNum`
    pub joy_num: i32,
}
impl AxisRecord {
    /// Same record with `invert` set
    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Same record with a different dead zone
    pub fn with_dead(mut self, dead: f32) -> Self {
        self.dead = dead;
        self
    }
}

/// Keyboard-style axis with the given name
pub fn axis(name: &str) -> AxisRecord {
    AxisRecord {
        name: name.to_string(),
        negative_button: "left".to_string(),
        positive_button: "right".to_string(),
        gravity: 3.0,
        dead: 0.001,
        sensitivity: 3.0,
        snap: true,
        invert: false,
        kind: 0,
        axis: 0,
        joy_num: 0,
    }
}

/// Filler that can never be mistaken for an array count
const FILLER: u8 = 0xee;

/// Serializes `records` between some header and trailer bytes, returning the file and the array's offset
pub fn container(records: &[AxisRecord]) -> (Vec<u8>, usize) {
    let mut buf = vec![FILLER; 16];
    let array = buf.len();
    buf.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for r in records {
        push_string(&mut buf, &r.name);
        push_string(&mut buf, "");
        push_string(&mut buf, "");
        push_string(&mut buf, &r.negative_button);
        push_string(&mut buf, &r.positive_button);
        push_string(&mut buf, "");
        push_string(&mut buf, "");
        buf.extend_from_slice(&r.gravity.to_le_bytes());
        buf.extend_from_slice(&r.dead.to_le_bytes());
        buf.extend_from_slice(&r.sensitivity.to_le_bytes());
        buf.push(u8::from(r.snap));
        buf.push(u8::from(r.invert));
        pad(&mut buf);
        buf.extend_from_slice(&r.kind.to_le_bytes());
        buf.extend_from_slice(&r.axis.to_le_bytes());
        buf.extend_from_slice(&r.joy_num.to_le_bytes());
    }
    buf.extend_from_slice(&[FILLER; 12]);
    (buf, array)
}

/// Length-prefixed, zero-padded string
fn push_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    pad(buf);
}

/// Zero padding to the next 4-byte boundary
fn pad(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

/// The five-axis layout most tests patch against
pub fn five_axes() -> Vec<AxisRecord> {
    vec![
        axis("Horizontal"),
        axis("Vertical"),
        axis("Fire1"),
        axis("Mouse Y"),
        axis("Mouse ScrollWheel"),
    ]
}
