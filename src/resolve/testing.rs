//! Registry fixtures shared by the resolver and grouping tests.
#![allow(clippy::unwrap_used)]

use crate::registry::Specification;

/// Feature 1.0 requires {A, B}, feature 1.1 requires {C}, extension X
/// requires {D}.
pub const SCENARIO: &str = r#"<registry>
    <commands>
        <command><proto><type>void</type> <name>A</name></proto></command>
        <command><proto><type>void</type> <name>B</name></proto>
            <param><type>VkInstance</type> <name>instance</name></param></command>
        <command><proto><type>void</type> <name>C</name></proto>
            <param><type>VkDevice</type> <name>device</name></param></command>
        <command><proto><type>void</type> <name>D</name></proto>
            <param><type>VkDevice</type> <name>device</name></param></command>
    </commands>
    <feature api="F" name="VK_VERSION_1_0" number="1.0">
        <require><command name="A"/><command name="B"/></require>
    </feature>
    <feature api="F" name="VK_VERSION_1_1" number="1.1">
        <require><command name="C"/></require>
    </feature>
    <extensions>
        <extension name="X" supported="F">
            <require><command name="D"/></require>
        </extension>
    </extensions>
</registry>"#;

/// Three core versions and an extension for every resolver rule.
///
/// None of the `F` extensions form a cycle or name an unknown command, so
/// the whole document can be resolved with every extension selected.
pub const RICH: &str = r#"<registry>
    <commands>
        <command name="DAlias" alias="D"/>
        <command><proto><type>void</type> <name>A</name></proto></command>
        <command><proto><type>void</type> <name>B</name></proto>
            <param><type>VkInstance</type> <name>instance</name></param></command>
        <command><proto><type>void</type> <name>C</name></proto>
            <param><type>VkDevice</type> <name>device</name></param></command>
        <command><proto><type>void</type> <name>D</name></proto>
            <param><type>VkDevice</type> <name>device</name></param></command>
        <command><proto><type>void</type> <name>E</name></proto>
            <param><type>VkQueue</type> <name>queue</name></param></command>
        <command><proto><type>void</type> <name>F</name></proto>
            <param><type>VkDevice</type> <name>device</name></param></command>
        <command><proto><type>void</type> <name>G</name></proto>
            <param><type>VkPhysicalDevice</type> <name>physicalDevice</name></param></command>
        <command><proto><type>void</type> <name>H</name></proto>
            <param><type>VkCommandBuffer</type> <name>commandBuffer</name></param></command>
        <command><proto><type>void</type> <name>I</name></proto>
            <param><type>VkDevice</type> <name>device</name></param></command>
        <command><proto><type>void</type> <name>J</name></proto>
            <param><type>VkDevice</type> <name>device</name></param></command>
    </commands>
    <feature api="F,G" name="VK_VERSION_1_0" number="1.0">
        <require><command name="A"/><command name="B"/></require>
    </feature>
    <feature api="F" name="VK_VERSION_1_1" number="1.1">
        <require><command name="C"/></require>
    </feature>
    <feature api="F" name="VK_VERSION_1_2" number="1.2">
        <require><command name="E"/></require>
        <remove><command name="B"/></remove>
    </feature>
    <extensions>
        <extension name="X" supported="F">
            <require><command name="DAlias"/></require>
        </extension>
        <extension name="Late" supported="F" requiresCore="1.2">
            <require><command name="F"/></require>
        </extension>
        <extension name="Base" supported="F">
            <require><command name="G"/><command name="A"/></require>
        </extension>
        <extension name="Either" supported="F" depends="Missing,Base"/>
        <extension name="Promoted" supported="F" promotedto="VK_VERSION_1_1">
            <require><command name="H"/></require>
        </extension>
        <extension name="Old" supported="F" deprecatedby="">
            <require><command name="I"/></require>
        </extension>
        <extension name="Gated" supported="F">
            <require depends="VK_VERSION_1_2"><command name="J"/></require>
        </extension>
        <extension name="NeedsV12" supported="F" depends="VK_VERSION_1_2"/>
        <extension name="NeedsOld" supported="F" depends="Old"/>
        <extension name="GOnly" supported="G"/>
    </extensions>
</registry>"#;

/// Parse a fixture, panicking on failure.
pub fn spec(text: &str) -> Specification {
    Specification::parse(text).unwrap()
}
