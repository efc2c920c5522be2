//! Big-endian cursor over class file bytes and the constant pool built on it.

use std::borrow::Cow;

use super::error::ClassParseError;

const MAGIC: u32 = 0xCAFE_BABE;

pub(crate) struct ClassReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ClassReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub(crate) fn expect_magic(&mut self) -> Result<(), ClassParseError> {
        if self.read_u4()? != MAGIC {
            return Err(ClassParseError::InvalidMagic);
        }
        Ok(())
    }

    pub(crate) fn read_u1(&mut self) -> Result<u8, ClassParseError> {
        let value = *self
            .data
            .get(self.pos)
            .ok_or(ClassParseError::UnexpectedEof)?;
        self.pos += 1;
        Ok(value)
    }

    pub(crate) fn read_u2(&mut self) -> Result<u16, ClassParseError> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_u4(&mut self) -> Result<u32, ClassParseError> {
        let bytes = self.read_slice(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn read_i4(&mut self) -> Result<i32, ClassParseError> {
        Ok(self.read_u4()? as i32)
    }

    pub(crate) fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ClassParseError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassParseError::UnexpectedEof)?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<(), ClassParseError> {
        self.read_slice(len).map(|_| ())
    }
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class { name_index: u16 },
    NameAndType { descriptor_index: u16 },
    MemberRef { name_and_type_index: u16 },
    Dynamic { name_and_type_index: u16 },
    Other,
    Unusable,
}

pub(crate) struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut ClassReader<'_>) -> Result<Self, ClassParseError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable); // index 0 unused

        while entries.len() < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    let bytes = reader.read_slice(length)?;
                    Constant::Utf8(decode_utf8(bytes).into_owned())
                }
                3 | 4 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                5 | 6 => {
                    // Long and Double occupy two slots.
                    if entries.len() + 1 >= count {
                        return Err(ClassParseError::InvalidConstantIndex {
                            index: entries.len() as u16,
                        });
                    }
                    reader.skip(8)?;
                    entries.push(Constant::Other);
                    Constant::Unusable
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                8 | 16 | 19 | 20 => {
                    reader.skip(2)?;
                    Constant::Other
                }
                9 | 10 | 11 => {
                    reader.skip(2)?; // class_index
                    Constant::MemberRef {
                        name_and_type_index: reader.read_u2()?,
                    }
                }
                12 => {
                    reader.skip(2)?; // name_index
                    Constant::NameAndType {
                        descriptor_index: reader.read_u2()?,
                    }
                }
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                17 | 18 => {
                    reader.skip(2)?; // bootstrap_method_attr_index
                    Constant::Dynamic {
                        name_and_type_index: reader.read_u2()?,
                    }
                }
                other => return Err(ClassParseError::UnsupportedConstant { tag: other }),
            };
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, ClassParseError> {
        self.entries
            .get(index as usize)
            .ok_or(ClassParseError::InvalidConstantIndex { index })
    }

    pub(crate) fn utf8(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    /// Internal name (or array descriptor) stored behind a `CONSTANT_Class`.
    pub(crate) fn class_name(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    /// Descriptor of a field, method or interface method reference.
    pub(crate) fn member_descriptor(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::MemberRef {
                name_and_type_index,
            } => self.name_and_type_descriptor(*name_and_type_index),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    /// Descriptor of an `invokedynamic` call site.
    pub(crate) fn dynamic_descriptor(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Dynamic {
                name_and_type_index,
            } => self.name_and_type_descriptor(*name_and_type_index),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    fn name_and_type_descriptor(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::NameAndType { descriptor_index } => self.utf8(*descriptor_index),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }
}

/// Class files store strings as modified UTF-8. Everything the scanner cares
/// about is plain ASCII, so invalid sequences are replaced rather than
/// rejecting the class.
fn decode_utf8(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
