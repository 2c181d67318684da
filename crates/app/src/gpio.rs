//! Digital input backends.
//!
//! Pull-ups are not configurable through sysfs; enable them in the board's
//! boot config (e.g. `gpio=14,15,17,18,27=ip,pu` on a Raspberry Pi).

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use pelikello_core::input::{InputPins, Pin};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Delay for udev to apply permissions to a freshly exported line.
const EXPORT_SETTLE: Duration = Duration::from_millis(100);

/// Picks the sysfs backend when a GPIO controller is present, otherwise a
/// backend on which every pin reads released.
pub fn open_default() -> Result<Box<dyn InputPins>> {
    let root = Path::new(SYSFS_GPIO_ROOT);
    if root.exists() {
        Ok(Box::new(SysfsPins::open(root, &Pin::ALL)?))
    } else {
        warn!(
            "{} not found, running without buttons or encoder",
            SYSFS_GPIO_ROOT
        );
        Ok(Box::new(IdlePins))
    }
}

/// Input lines read through the Linux sysfs GPIO interface.
///
/// Lines this backend exported are unexported again on drop.
pub struct SysfsPins {
    root: PathBuf,
    values: HashMap<Pin, File>,
    exported: Vec<u32>,
}

impl SysfsPins {
    pub fn open(root: &Path, pins: &[Pin]) -> Result<Self> {
        let mut this = Self {
            root: root.to_path_buf(),
            values: HashMap::new(),
            exported: Vec::new(),
        };

        // `this` is dropped on error, which unexports what was exported so far
        for &pin in pins {
            let line = pin.bcm();
            let dir = this.root.join(format!("gpio{}", line));
            if !dir.exists() {
                write_sysfs(&this.root.join("export"), &line.to_string())
                    .with_context(|| format!("Failed to export GPIO {}", line))?;
                this.exported.push(line);
                thread::sleep(EXPORT_SETTLE);
            }

            let direction = dir.join("direction");
            if direction.exists() {
                write_sysfs(&direction, "in")
                    .with_context(|| format!("Failed to set GPIO {} as input", line))?;
            }

            let value = File::open(dir.join("value"))
                .with_context(|| format!("Failed to open GPIO {} value", line))?;
            this.values.insert(pin, value);
            debug!("GPIO {} ready for {:?}", line, pin);
        }

        info!("Opened {} GPIO inputs via sysfs", this.values.len());
        Ok(this)
    }
}

impl InputPins for SysfsPins {
    fn read_pin(&mut self, pin: Pin) -> Result<bool> {
        let file = self
            .values
            .get_mut(&pin)
            .ok_or_else(|| anyhow!("GPIO {} ({:?}) was not opened", pin.bcm(), pin))?;

        let mut level = [0u8; 1];
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.read_exact(&mut level))
            .with_context(|| format!("Failed to read GPIO {}", pin.bcm()))?;

        match level[0] {
            b'0' => Ok(false),
            b'1' => Ok(true),
            other => Err(anyhow!(
                "Unexpected GPIO {} value byte {:#04x}",
                pin.bcm(),
                other
            )),
        }
    }
}

impl Drop for SysfsPins {
    fn drop(&mut self) {
        self.values.clear();
        for line in self.exported.drain(..) {
            if let Err(e) = write_sysfs(&self.root.join("unexport"), &line.to_string()) {
                warn!("Failed to unexport GPIO {}: {}", line, e);
            }
        }
    }
}

fn write_sysfs(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;
    file.write_all(value.as_bytes())
}

/// Every pin reads high (released).
pub struct IdlePins;

impl InputPins for IdlePins {
    fn read_pin(&mut self, _pin: Pin) -> Result<bool> {
        Ok(true)
    }
}
