//! Built-in manifests for the three emblem scenes.
//!
//! Models and symbols are referenced by file name and resolved through the
//! caller's asset source.

pub const CANADA: &str = r#"<scene name="canada">
    <background>255 255 255</background>
    <object>
        <name>Camera</name>
        <type>camera</type>
        <fov>45</fov>
        <position>0 0 8</position>
    </object>
    <object>
        <name>Sun</name>
        <type>light</type>
        <light>directional</light>
        <intensity>3</intensity>
        <position>0 3 2.2</position>
    </object>
    <object>
        <name>Ambient</name>
        <type>light</type>
        <light>ambient</light>
        <intensity>1.5</intensity>
    </object>
    <object>
        <name>Left bar</name>
        <type>bar</type>
        <color>255 0 0</color>
        <material>canada</material>
        <size>8 10 0.8</size>
        <position>-6.2 0 0</position>
    </object>
    <object>
        <name>Right bar</name>
        <type>bar</type>
        <color>255 0 0</color>
        <material>canada</material>
        <size>8 10 0.8</size>
        <position>6.2 0 0</position>
    </object>
    <object>
        <name>Maple leaf</name>
        <type>model</type>
        <asset>maple_leaf.obj</asset>
        <color>255 0 0</color>
        <material>canada</material>
        <scale>15 15 15</scale>
        <rotation>1.5707964 0 0</rotation>
        <spin>0 0 0.005</spin>
    </object>
</scene>
"#;

pub const QUEBEC: &str = r#"<scene name="quebec">
    <background>0 61 165</background>
    <object>
        <name>Camera</name>
        <type>camera</type>
        <fov>45</fov>
        <position>0 0 8</position>
    </object>
    <object>
        <name>Sun</name>
        <type>light</type>
        <light>directional</light>
        <intensity>3</intensity>
        <position>0 3 2.2</position>
    </object>
    <object>
        <name>Ambient</name>
        <type>light</type>
        <light>ambient</light>
        <intensity>1.5</intensity>
    </object>
    <object>
        <name>Cross</name>
        <type>cross</type>
        <color>255 255 255</color>
        <material>quebec</material>
        <half-width>0.375</half-width>
        <reach>10</reach>
        <depth>0.8</depth>
        <bevel>0.05 0.05 2</bevel>
        <position>0 0 -0.4</position>
    </object>
    <object>
        <name>Fleur-de-lis</name>
        <type>model</type>
        <asset>quebec-fleur-de-lis.obj</asset>
        <color>255 255 255</color>
        <material>quebec</material>
        <scale>20 20 20</scale>
        <rotation>1.5707964 0 0</rotation>
        <layout>quadrants</layout>
        <spin>0 0 0.005</spin>
    </object>
</scene>
"#;

pub const MONTREAL: &str = r#"<scene name="montreal">
    <background>255 255 255</background>
    <object>
        <name>Camera</name>
        <type>camera</type>
        <fov>45</fov>
        <position>0 0 8</position>
    </object>
    <object>
        <name>Sun</name>
        <type>light</type>
        <light>directional</light>
        <intensity>3</intensity>
        <position>0 3 2.2</position>
    </object>
    <object>
        <name>Ambient</name>
        <type>light</type>
        <light>ambient</light>
        <intensity>1.5</intensity>
    </object>
    <object>
        <name>Cross</name>
        <type>cross</type>
        <color>213 27 48</color>
        <material>glass</material>
        <half-width>0.375</half-width>
        <reach>10</reach>
        <radius>1</radius>
        <depth>0.8</depth>
        <bevel>0.05 0.05 2</bevel>
        <position>0 0 -0.4</position>
    </object>
    <object>
        <name>Pin blanc</name>
        <type>symbol</type>
        <asset>pin-blanc.svg</asset>
        <scale>0.5 0.5 0.5</scale>
        <position>0 0 1</position>
        <spin>0 -0.005 0</spin>
    </object>
    <object>
        <name>Fleur-de-lis</name>
        <type>symbol</type>
        <asset>montreal-fleur-de-lis.svg</asset>
        <anchor>top-left</anchor>
        <scale>0.5 0.5 0.5</scale>
        <position>0 0 1</position>
        <spin>0 -0.005 0</spin>
    </object>
    <object>
        <name>Rose</name>
        <type>symbol</type>
        <asset>rose.svg</asset>
        <anchor>top-right</anchor>
        <scale>0.5 0.5 0.5</scale>
        <position>0 0 1</position>
        <spin>0 -0.005 0</spin>
    </object>
    <object>
        <name>Trefle</name>
        <type>symbol</type>
        <asset>trefle.svg</asset>
        <anchor>bottom-right</anchor>
        <scale>0.5 0.5 0.5</scale>
        <position>0 0 1</position>
        <spin>0 -0.005 0</spin>
    </object>
    <object>
        <name>Chardon</name>
        <type>symbol</type>
        <asset>chardon.svg</asset>
        <anchor>bottom-left</anchor>
        <scale>0.5 0.5 0.5</scale>
        <position>0 0 1</position>
        <spin>0 -0.005 0</spin>
    </object>
</scene>
"#;

/// Looks up a built-in manifest by scene name.
pub fn builtin(name: &str) -> Option<&'static str> {
    match name {
        "canada" => Some(CANADA),
        "quebec" => Some(QUEBEC),
        "montreal" => Some(MONTREAL),
        _ => None,
    }
}
