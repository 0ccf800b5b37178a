mod usecases;

pub use usecases::Pkcs11Pal;
