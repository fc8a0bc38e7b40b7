use crate::{ok, AnyResult};
use anyhow::{bail, ensure};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use glam::{Quat, Vec2, Vec3, Vec4};
use std::io::{Read, Write};

/// Maximum length of a packed string, including the terminator.
const STRING_SIZE_LIMIT: usize = 8192;

/// Maximum element count accepted by [`read_counted`].
const COUNTED_LIMIT: u32 = 1 << 20;

/// Special trait for reading packed data, always assumed to be little endian.
pub trait PackedData: Sized + Clone {
    fn read_packed<R: Read>(r: &mut R) -> AnyResult<Self>;
    fn write_packed<W: Write>(&self, w: &mut W) -> AnyResult;
}

macro_rules! impl_data {
    ($type:ty, $r:ident, $reader:expr, $w:ident, $self:ident, $writer:expr) => {
        impl PackedData for $type {
            fn read_packed<R: Read>($r: &mut R) -> AnyResult<Self> {
                Ok($reader)
            }

            fn write_packed<W: Write>(&self, $w: &mut W) -> AnyResult {
                let $self = self;
                $writer;
                Ok(())
            }
        }
    };
}

impl_data!(u8, r, r.read_u8()?, w, value, w.write_u8(*value)?);
impl_data!(
    u16,
    r,
    r.read_u16::<LE>()?,
    w,
    value,
    w.write_u16::<LE>(*value)?
);
impl_data!(
    u32,
    r,
    r.read_u32::<LE>()?,
    w,
    value,
    w.write_u32::<LE>(*value)?
);
impl_data!(
    i32,
    r,
    r.read_i32::<LE>()?,
    w,
    value,
    w.write_i32::<LE>(*value)?
);
impl_data!(
    f32,
    r,
    r.read_f32::<LE>()?,
    w,
    value,
    w.write_f32::<LE>(*value)?
);

// Booleans are a single byte, anything other than 0 or 1 is rejected so that garbage doesn't
// silently turn into `true`
impl_data!(
    bool,
    r,
    match r.read_u8()? {
        0 => false,
        1 => true,
        other => bail!("invalid boolean byte {other:#04x}"),
    },
    w,
    value,
    w.write_u8(*value as u8)?
);

impl_data!(
    Vec2,
    r,
    Vec2::new(r.read_f32::<LE>()?, r.read_f32::<LE>()?),
    w,
    value,
    {
        w.write_f32::<LE>(value.x)?;
        w.write_f32::<LE>(value.y)?;
    }
);

impl_data!(
    Vec3,
    r,
    Vec3::new(
        r.read_f32::<LE>()?,
        r.read_f32::<LE>()?,
        r.read_f32::<LE>()?
    ),
    w,
    value,
    {
        for component in value.to_array() {
            w.write_f32::<LE>(component)?;
        }
    }
);

impl_data!(
    Vec4,
    r,
    Vec4::new(
        r.read_f32::<LE>()?,
        r.read_f32::<LE>()?,
        r.read_f32::<LE>()?,
        r.read_f32::<LE>()?
    ),
    w,
    value,
    {
        for component in value.to_array() {
            w.write_f32::<LE>(component)?;
        }
    }
);

// Quaternions are stored as XYZW
impl_data!(Quat, r, Quat::from_vec4(Vec4::read_packed(r)?), w, value, {
    Vec4::from(*value).write_packed(w)?
});

// NUL-terminated UTF-8
impl_data!(
    String,
    r,
    {
        let mut result = Vec::with_capacity(32);

        loop {
            let next = r.read_u8()?;
            if next == 0 {
                break;
            } else if result.len() + 1 == STRING_SIZE_LIMIT {
                bail!("max string size ({STRING_SIZE_LIMIT} bytes) reached");
            } else {
                result.push(next);
            }
        }

        String::from_utf8(result)?
    },
    w,
    value,
    {
        ensure!(
            !value.as_bytes().contains(&0),
            "packed strings can't contain NUL bytes"
        );
        ensure!(
            value.len() < STRING_SIZE_LIMIT,
            "max string size ({STRING_SIZE_LIMIT} bytes) reached"
        );
        w.write_all(value.as_bytes())?;
        w.write_all(&[0])?;
    }
);

/// Reads a `u32` element count followed by that many [`PackedData`] values.
pub fn read_counted<T: PackedData, R: Read>(r: &mut R) -> AnyResult<Vec<T>> {
    let count = r.read_u32::<LE>()?;
    ensure!(
        count <= COUNTED_LIMIT,
        "element count {count} exceeds the limit of {COUNTED_LIMIT}"
    );

    let mut result = Vec::with_capacity(count as usize);
    for _ in 0..count {
        result.push(T::read_packed(r)?);
    }
    Ok(result)
}

/// Counterpart of [`read_counted`].
pub fn write_counted<T: PackedData, W: Write>(w: &mut W, values: &[T]) -> AnyResult {
    ensure!(
        values.len() <= COUNTED_LIMIT as usize,
        "too many elements to write ({})",
        values.len()
    );

    w.write_u32::<LE>(values.len() as u32)?;
    for value in values {
        value.write_packed(w)?;
    }
    ok()
}

/// Trait with a `write_packed` wrapper method for any [`Write`] type, purely for clarity.
pub trait PackedWriteExt {
    /// Writes the specified [`PackedData`] object into this stream.
    fn write_packed(&mut self, t: impl PackedData) -> AnyResult;
}

impl<T: Write> PackedWriteExt for T {
    fn write_packed(&mut self, t: impl PackedData) -> AnyResult {
        t.write_packed(self)
    }
}

/// Trait with a `read_packed` wrapper method for any [`Read`] type, purely for clarity.
pub trait PackedReadExt {
    /// Reads the specified [`PackedData`] type from this stream.
    fn read_packed<T: PackedData>(&mut self) -> AnyResult<T>;
}

impl<T: Read> PackedReadExt for T {
    fn read_packed<R: PackedData>(&mut self) -> AnyResult<R> {
        R::read_packed(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn strings_are_nul_terminated() {
        let mut buffer = vec![];
        buffer.write_packed(String::from("river")).unwrap();
        assert_eq!(buffer, b"river\0");

        let read: String = Cursor::new(&buffer).read_packed().unwrap();
        assert_eq!(read, "river");
    }

    #[test]
    fn strings_with_nul_are_rejected() {
        let mut buffer = vec![];
        assert!(buffer.write_packed(String::from("ra\0ft")).is_err());
    }

    #[test]
    fn invalid_booleans_are_rejected() {
        let result: AnyResult<bool> = Cursor::new([2u8]).read_packed();
        assert!(result.is_err());

        let result: bool = Cursor::new([1u8]).read_packed().unwrap();
        assert!(result);
    }

    #[test]
    fn quaternions_are_stored_xyzw() {
        let mut buffer = vec![];
        buffer.write_packed(Quat::IDENTITY).unwrap();
        assert_eq!(buffer.len(), 16);
        assert_eq!(&buffer[12..16], &1.0f32.to_le_bytes());
    }

    #[test]
    fn counted_lists() {
        let points = vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 2.0, 3.0)];
        let mut buffer = vec![];
        write_counted(&mut buffer, &points).unwrap();
        assert_eq!(buffer.len(), 4 + 3 * 12);

        let read: Vec<Vec3> = read_counted(&mut Cursor::new(&buffer)).unwrap();
        assert_eq!(read, points);

        // Truncated input
        assert!(read_counted::<Vec3, _>(&mut Cursor::new(&buffer[..20])).is_err());
    }
}
