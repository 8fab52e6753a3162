use crate::gb::cartridge::mbc1::MBC1;
use crate::gb::cartridge::nombc::NoMBC;
use crate::gb::cartridge::{CartridgeConfig, ControllerType};
use dyn_clone::DynClone;
use std::sync::Arc;

/// Capability interface of all cartridge bank controllers.
pub trait BankController: DynClone + Send {
    fn read(&mut self, address: u16) -> u8;

    fn write(&mut self, address: u16, value: u8);

    fn controller_type(&self) -> ControllerType;

    fn has_ram(&self) -> bool;
}

dyn_clone::clone_trait_object!(BankController);

/// Creates the `BankController` matching the given `CartridgeConfig`.
pub fn new(config: CartridgeConfig, rom: Arc<[u8]>) -> Box<dyn BankController> {
    match config.controller {
        ControllerType::NoMBC | ControllerType::NoMBCWithRAM => Box::new(NoMBC::new(config, rom)),
        ControllerType::MBC1 | ControllerType::MBC1WithRAM => Box::new(MBC1::new(config, rom)),
    }
}
